//! Command dispatch
//!
//! Resolves configuration, initializes the platform client once and runs
//! the selected operation.

use anyhow::{Context, Result};
use colored::Colorize;
use concierge_agent::AgentDefinition;
use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use tracing::{info, warn};

use crate::cli::{Cli, Operation};
use crate::commands;
use crate::config::PartialConfig;
use crate::platform::{AgentPlatform, InitParams};

/// Operation bound to its arguments
enum Command<'a> {
    Create,
    Delete(&'a str),
    Quicktest(&'a str),
}

/// Run the operation selected on the command line
///
/// `env` looks up fallback variables; `init` builds the platform client and
/// is called at most once, only after configuration is valid.
pub async fn run<P, F, Fut, W>(
    cli: &Cli,
    definition: &AgentDefinition,
    env: impl Fn(&str) -> Option<String>,
    init: F,
    out: &mut W,
) -> Result<()>
where
    P: AgentPlatform,
    F: FnOnce(InitParams) -> Fut,
    Fut: Future<Output = Result<P>>,
    W: Write,
{
    let operation = cli.operation.operation()?;

    let partial = PartialConfig::resolve(
        cli.project_id.as_deref(),
        cli.location.as_deref(),
        cli.bucket.as_deref(),
        env,
    );
    for line in partial.summary() {
        writeln!(out, "{}", line)?;
    }

    let config = match partial.validate() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Configuration incomplete");
            writeln!(out, "{}", e.to_string().red())?;
            return Ok(());
        }
    };

    let command = match (operation, cli.resource_id.as_deref().filter(|id| !id.trim().is_empty())) {
        (Operation::Create, _) => Command::Create,
        (Operation::Delete, Some(id)) => Command::Delete(id),
        (Operation::Quicktest, Some(id)) => Command::Quicktest(id),
        (_, None) => {
            writeln!(out, "{}", format!("resource_id is required for {}", operation).red())?;
            return Ok(());
        }
    };

    let params = config.init_params();
    info!(
        operation = %operation,
        project = %params.project,
        location = %params.location,
        "Initializing platform client"
    );
    let platform = init(params)
        .await
        .context("Failed to initialize platform client")?;

    match command {
        Command::Create => {
            let env_vars: HashMap<String, String> = HashMap::new();
            commands::create::run(&platform, definition, &env_vars, out).await?;
        }
        Command::Delete(id) => {
            commands::delete::run(&platform, id, out).await?;
        }
        Command::Quicktest(id) => {
            let outcome = commands::quicktest::run(&platform, id, &cli.message, out).await?;
            info!(outcome = ?outcome, "Quick test complete");
        }
    }

    Ok(())
}

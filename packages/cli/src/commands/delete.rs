use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use tracing::info;

use crate::platform::AgentPlatform;

/// Force-delete a remote agent together with its sessions
pub async fn run<W: Write>(platform: &dyn AgentPlatform, resource_id: &str, out: &mut W) -> Result<()> {
    writeln!(out, "{} Deleting remote agent {}...", "→".blue().bold(), resource_id)?;

    let remote = platform
        .get(resource_id)
        .await
        .with_context(|| format!("Failed to fetch remote agent {}", resource_id))?;

    remote
        .delete(true)
        .await
        .with_context(|| format!("Failed to delete remote agent {}", remote.resource_name()))?;

    info!(resource_id = %resource_id, "Remote agent deleted");
    writeln!(out, "{} Deleted remote agent: {}", "✓".green().bold(), resource_id)?;

    Ok(())
}

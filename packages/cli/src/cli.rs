//! Command line interface
//!
//! Flag layout of the `concierge-deploy` binary. Exactly one of the
//! operation flags must be given.

use clap::{Args, Parser};
use std::path::PathBuf;

use crate::commands::quicktest::DEFAULT_MESSAGE;
use crate::config::{ConfigError, DEFAULT_ENV_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "concierge-deploy",
    about = "Concierge Deploy - Create, delete and smoke-test the hosted concierge agent"
)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub operation: OperationFlags,

    /// Google Cloud project ID
    #[arg(long = "project_id")]
    pub project_id: Option<String>,

    /// Google Cloud location
    #[arg(long)]
    pub location: Option<String>,

    /// Google Cloud Storage bucket used for staging
    #[arg(long)]
    pub bucket: Option<String>,

    /// Resource ID for delete and quicktest
    #[arg(long = "resource_id")]
    pub resource_id: Option<String>,

    /// Message sent by --quicktest
    #[arg(long, default_value = DEFAULT_MESSAGE)]
    pub message: String,

    /// Env file loaded before variables are resolved
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Mutually exclusive operation switches
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = true, multiple = false)]
pub struct OperationFlags {
    /// Creates a new deployment
    #[arg(long)]
    pub create: bool,

    /// Deletes an existing deployment
    #[arg(long)]
    pub delete: bool,

    /// Runs a quick test with the deployed agent
    #[arg(long)]
    pub quicktest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
    Quicktest,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Delete => write!(f, "delete"),
            Operation::Quicktest => write!(f, "quicktest"),
        }
    }
}

impl OperationFlags {
    /// The single selected operation
    pub fn operation(&self) -> Result<Operation, ConfigError> {
        let selected: Vec<Operation> = [
            (self.create, Operation::Create),
            (self.delete, Operation::Delete),
            (self.quicktest, Operation::Quicktest),
        ]
        .into_iter()
        .filter_map(|(set, op)| set.then_some(op))
        .collect();

        match selected.as_slice() {
            [op] => Ok(*op),
            [] => Err(ConfigError::NoOperation),
            many => Err(ConfigError::ConflictingOperations(
                many.iter()
                    .map(|op| format!("--{}", op))
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }
}

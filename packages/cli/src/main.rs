use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use concierge_agent::root_agent;
use concierge_deploy::config::{self, Settings};
use concierge_deploy::{app, Cli, VertexPlatform};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the command report
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if config::load_env_file(&cli.env_file) {
        debug!(path = %cli.env_file.display(), "Environment file loaded");
    }
    let settings = Settings::load()?;
    let definition = root_agent();

    let mut stdout = std::io::stdout();
    app::run(
        &cli,
        &definition,
        |key| std::env::var(key).ok(),
        move |params| async move {
            Ok::<_, anyhow::Error>(VertexPlatform::connect(params, settings).await?)
        },
        &mut stdout,
    )
    .await
}

//! Task runner for the deterministic vault factory.
//!
//! Reads configuration from `.env`, an optional TOML file and the command
//! line, connects to the selected network and runs one task.

mod cli;
mod commands;

use clap::Parser;

use crate::cli::Cli;

fn setup_log() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};
    if tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init()
        .is_err()
    {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    setup_log();
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    commands::run(cli).await
}

//! GeoSight CLI - Command-line interface
//!
//! Drives the GeoSight workbench headlessly: the drawn area comes from
//! command-line bounds instead of a map.

mod canvas;
mod cli;
mod commands;
mod config_loader;
mod errors;
mod interactive;
mod output;
mod output_types;
mod progress;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Logs go to stderr so `--json` output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Create async runtime
    let runtime = tokio::runtime::Runtime::new()?;

    // Execute the command
    if let Err(e) = runtime.block_on(async { commands::execute(cli).await }) {
        errors::from_anyhow(e).display();
        std::process::exit(1);
    }

    Ok(())
}

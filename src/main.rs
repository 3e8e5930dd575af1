//! # Data Explorer entry point
//!
//! ```text
//! main()
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Resolve config (file → env → flags), init logging
//!   ├─> Build the tool host around one shared registry
//!   └─> Run the subcommand (default: serve JSON-RPC on stdio)
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use anyhow::Result;
use clap::Parser as _;
use data_explorer::logging::{self, LoggingOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.resolve_config();
    config.validate()?;

    logging::init(&LoggingOptions {
        file_logging: config.file_logging,
        log_dir: config.log_dir.clone(),
    })?;
    tracing::debug!("Effective config: {config:?}");

    let host = data_explorer::build_host(&config);
    let command = cli.command.unwrap_or(cli::Commands::Serve);
    cli::run_command(host, &config, cli.config.as_deref(), command).await
}

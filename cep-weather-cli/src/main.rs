//! Binary crate for the `cep-weather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Hosting a single lookup (deadline, Ctrl-C cancellation, exit codes)

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    logging::init(cmd.verbose, cmd.json_logs);
    cmd.run().await
}

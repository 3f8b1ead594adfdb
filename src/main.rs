//! mlbf conformance runner
//!
//! Runs the built `mlbf` interpreter against every script in `./tests` and
//! checks its output against the `.out` fixtures. With no arguments it
//! behaves like `mlbf-conformance run`.

use std::path::PathBuf;

use clap::Parser;
use conformance::cli;
use conformance::commands::{Commands, RunArgs};
use conformance::common::logging;

#[derive(Parser)]
#[command(name = "mlbf-conformance", about = "Conformance test runner for mlbf")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: ./conformance.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Run(RunArgs::default()));

    if let Err(e) = cli::dispatch(command, cli.config.as_deref()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

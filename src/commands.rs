//! CLI command definitions
//!
//! Defines the clap commands for the conformance runner. Every flag is an
//! override on top of `conformance.toml`.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run every test case and verify its output (default)
    Run(RunArgs),

    /// List discovered test cases without running them
    List {
        #[command(flatten)]
        fixtures: FixtureArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Where to look for test cases
#[derive(Args, Default)]
pub struct FixtureArgs {
    /// Directory containing test sources (default: ./tests)
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// Extension of test sources, without the dot (default: b)
    #[arg(long)]
    pub extension: Option<String>,
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Path to the target program (default: ./builddir/mlbf)
    #[arg(long)]
    pub program: Option<PathBuf>,

    #[command(flatten)]
    pub fixtures: FixtureArgs,

    /// Kill a test case after this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Stop at the first failing test case
    #[arg(long)]
    pub fail_fast: bool,

    /// Show passing cases and totals
    #[arg(long, short)]
    pub verbose: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

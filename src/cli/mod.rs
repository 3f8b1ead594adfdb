//! CLI command handling
//!
//! Merges flags into the loaded configuration, dispatches to the runner and
//! formats output.

use std::path::Path;

use crate::commands::{Commands, FixtureArgs, RunArgs};
use crate::common::config::Config;
use crate::common::Result;
use crate::testing::report::{self, CaseListing};
use crate::testing::{self, RunSettings, TestCase};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match command {
        Commands::Run(args) => {
            apply_run_args(&mut config, &args);
            config.validate()?;
            let settings = RunSettings::from(&config);

            let summary = testing::run_suite(&settings).await?;

            if args.json {
                println!("{}", report::to_json(&summary)?);
            } else {
                report::print_human(&summary, args.verbose);
            }

            summary.into_result().map(|_| ())
        }

        Commands::List { fixtures, json } => {
            apply_fixture_args(&mut config, &fixtures);
            config.validate()?;

            let cases = testing::discover(&config.fixtures.dir, &config.fixtures.extension)?
                .map(|source| TestCase::resolve(&source, &config.fixtures.extension))
                .collect::<Result<Vec<_>>>()?;
            let listing: Vec<CaseListing> = cases.iter().map(CaseListing::from).collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                report::print_listing(&listing);
            }

            Ok(())
        }
    }
}

fn apply_fixture_args(config: &mut Config, args: &FixtureArgs) {
    if let Some(dir) = &args.fixtures {
        config.fixtures.dir = dir.clone();
    }
    if let Some(ext) = &args.extension {
        config.fixtures.extension = ext.trim_start_matches('.').to_string();
    }
}

fn apply_run_args(config: &mut Config, args: &RunArgs) {
    if let Some(program) = &args.program {
        config.target.program = program.clone();
    }
    apply_fixture_args(config, &args.fixtures);
    if let Some(secs) = args.timeout {
        config.run.timeout_secs = Some(secs);
    }
    if args.fail_fast {
        config.run.fail_fast = true;
    }
}

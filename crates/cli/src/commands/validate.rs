//! Validate scenario files without running a browser

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use navcheck::config::NavcheckConfig;
use navcheck::scenario::{check_unique_names, scenario_files};
use navcheck::Scenario;

use crate::output::{print_error, print_success};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to scenario directory (built-in scenarios when omitted)
    #[arg(short, long)]
    pub scenarios: Option<PathBuf>,
}

/// Returns whether every file is valid
pub fn execute(args: ValidateArgs, config: &NavcheckConfig) -> Result<bool> {
    let Some(dir) = args.scenarios.or_else(|| config.scenarios_dir.clone()) else {
        let scenarios = Scenario::builtin()?;
        print_success(&format!("{} built-in scenario(s) are valid", scenarios.len()));
        return Ok(true);
    };

    let mut problems = 0;
    let mut scenarios = Vec::new();
    for path in scenario_files(&dir)? {
        match Scenario::from_file(&path) {
            Ok(parsed) => scenarios.extend(parsed),
            Err(e) => {
                problems += 1;
                print_error(&e.to_string());
            }
        }
    }

    if let Err(e) = check_unique_names(&scenarios) {
        problems += 1;
        print_error(&e.to_string());
    }

    if problems == 0 {
        print_success(&format!("{} scenario(s) in {} are valid", scenarios.len(), dir.display()));
    }
    Ok(problems == 0)
}

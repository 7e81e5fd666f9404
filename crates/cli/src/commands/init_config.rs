//! Write a default configuration file

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use navcheck::config::{NavcheckConfig, DEFAULT_CONFIG_FILE};

use crate::output::print_success;

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the configuration
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: InitConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", args.path.display());
    }

    NavcheckConfig::default().save(&args.path)?;
    print_success(&format!("Wrote {}", args.path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "jobs = 2\n").unwrap();

        let args = InitConfigArgs { path: path.clone(), force: false };
        assert!(execute(args).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "jobs = 2\n");

        let args = InitConfigArgs { path: path.clone(), force: true };
        execute(args).unwrap();
        assert_eq!(NavcheckConfig::load(&path).unwrap().jobs, 1);
    }
}

//! CLI Commands

pub mod init_config;
pub mod list;
pub mod run;
pub mod validate;

use std::path::Path;

use navcheck::{NavResult, Scenario};
use tracing::info;

/// Scenarios from `dir`, or the built-in catalog when no directory is given
pub fn load_scenarios(dir: Option<&Path>) -> NavResult<Vec<Scenario>> {
    match dir {
        Some(dir) => {
            let scenarios = Scenario::load_all(dir)?;
            info!("Loaded {} scenario(s) from {}", scenarios.len(), dir.display());
            Ok(scenarios)
        }
        None => Scenario::builtin(),
    }
}

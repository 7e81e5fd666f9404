//! Run navigation scenarios against the application

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use navcheck::config::NavcheckConfig;
use navcheck::playwright::{Browser, PlaywrightFactory};
use navcheck::server::ServerHandle;
use navcheck::{Runner, RunnerConfig, Scenario, SuiteResult};
use tracing::info;

use crate::output::{print_suite, print_warning, OutputFormat};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Path to scenario directory (built-in scenarios when omitted)
    #[arg(short, long)]
    pub scenarios: Option<PathBuf>,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Base URL of an already running application
    #[arg(long, env = "NAVCHECK_BASE_URL")]
    pub base_url: Option<String>,

    /// Command that starts the application, e.g. --serve npm run dev
    #[arg(long, num_args = 1.., allow_hyphen_values = true, conflicts_with = "base_url")]
    pub serve: Option<Vec<String>>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    pub browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Scenarios run at the same time
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Runs per scenario, each in a fresh session
    #[arg(long)]
    pub repeat: Option<usize>,

    /// Output directory for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply(&self, config: &mut NavcheckConfig) {
        if let Some(dir) = &self.scenarios {
            config.scenarios_dir = Some(dir.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.server.base_url = base_url.clone();
            config.server.command.clear();
        }
        if let Some(command) = &self.serve {
            config.server.command = command.clone();
        }
        if let Some(browser) = self.browser {
            config.browser.kind = browser;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(repeat) = self.repeat {
            config.repeat = repeat;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
    }
}

/// Returns whether every scenario passed
pub async fn execute(args: RunArgs, mut config: NavcheckConfig, format: OutputFormat) -> Result<bool> {
    args.apply(&mut config);
    config.validate()?;

    let scenarios = super::load_scenarios(config.scenarios_dir.as_deref())?;
    let selected = Scenario::select(&scenarios, args.name.as_deref(), args.tag.as_deref())?;
    if selected.is_empty() {
        print_warning("No scenarios matched the selection");
        print_suite(&SuiteResult::empty(), format);
        return Ok(true);
    }

    let mut server = ServerHandle::start(&config.server).await?;
    let factory = PlaywrightFactory::new(config.playwright(server.base_url()))?;

    let runner = Runner::new(
        Arc::new(factory),
        RunnerConfig {
            timeouts: config.timeouts.clone(),
            jobs: config.jobs,
            repeat: config.repeat,
            output_dir: config.output_dir.clone(),
        },
    );

    let suite = runner.run_scenarios(selected).await;

    runner.write_results(&suite)?;
    server.stop()?;

    print_suite(&suite, format);
    info!("Checked {} scenario(s) against {}", suite.total, server.base_url());

    Ok(suite.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_switches_to_attach_mode() {
        let mut config = NavcheckConfig::default();
        config.server.command = vec!["npm".to_string(), "run".to_string(), "dev".to_string()];

        let args = RunArgs {
            base_url: Some("http://localhost:5173".to_string()),
            jobs: Some(3),
            headed: true,
            ..Default::default()
        };
        args.apply(&mut config);

        assert!(!config.server.spawns());
        assert_eq!(config.server.base_url, "http://localhost:5173");
        assert_eq!(config.jobs, 3);
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_serve_command_enables_spawn_mode() {
        let mut config = NavcheckConfig::default();
        let args = RunArgs {
            serve: Some(vec!["npm".to_string(), "run".to_string(), "dev".to_string()]),
            browser: Some(Browser::Webkit),
            ..Default::default()
        };
        args.apply(&mut config);

        assert!(config.server.spawns());
        assert_eq!(config.browser.kind, Browser::Webkit);
        assert_eq!(config.repeat, 1);
    }
}

use std::process::Command;
use std::sync::Arc;

use navcheck::config::NavcheckConfig;
use navcheck::playwright::PlaywrightFactory;
use navcheck::server::ServerHandle;
use navcheck::{Runner, RunnerConfig, Scenario};

fn in_path(bin: &str) -> bool {
    Command::new("sh")
        .arg("-lc")
        .arg(format!("command -v {bin} >/dev/null 2>&1"))
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Built-in scenarios against a real browser
///
/// Needs Playwright (`npx playwright install chromium`) and the application
/// under test running at `NAVCHECK_BASE_URL`.
#[tokio::test]
#[ignore]
async fn builtin_scenarios_pass_in_real_browser() {
    if !in_path("npx") {
        eprintln!("Skipping: npx not available in PATH");
        return;
    }
    let Ok(base_url) = std::env::var("NAVCHECK_BASE_URL") else {
        eprintln!("Skipping: NAVCHECK_BASE_URL not set");
        return;
    };

    let mut config = NavcheckConfig::default();
    config.server.base_url = base_url;
    config.server.startup_timeout_secs = 10;

    let server = ServerHandle::start(&config.server).await.expect("application reachable");
    let factory = PlaywrightFactory::new(config.playwright(server.base_url()))
        .expect("playwright installed");

    let output = tempfile::tempdir().unwrap();
    let runner = Runner::new(
        Arc::new(factory),
        RunnerConfig {
            output_dir: output.path().to_path_buf(),
            ..Default::default()
        },
    );

    let suite = runner.run_all(&Scenario::builtin().unwrap()).await;
    for result in &suite.results {
        assert!(result.success(), "{}: {:?}", result.name, result.error);
    }
}

//! Suite runner behavior: isolation, ordering, repetition and reporting

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use navcheck::sim::{SimLink, SimulatedSite};
use navcheck::{
    FailureKind, NavResult, PageSession, Runner, RunnerConfig, Scenario, ScenarioStatus,
    SessionFactory, SuiteResult, Timeouts,
};

const BASE: &str = "http://127.0.0.1:1420";

fn config(jobs: usize, repeat: usize, output_dir: std::path::PathBuf) -> RunnerConfig {
    RunnerConfig {
        timeouts: Timeouts {
            navigation_ms: 100,
            assertion_ms: 100,
            poll_interval_ms: 5,
            load_ms: 1000,
        },
        jobs,
        repeat,
        output_dir,
    }
}

/// Alternates between a healthy site and one whose settings link is dead
struct AlternatingSite {
    healthy: SimulatedSite,
    broken: SimulatedSite,
    opened: AtomicUsize,
}

#[async_trait]
impl SessionFactory for AlternatingSite {
    async fn open(&self) -> NavResult<Box<dyn PageSession>> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst);
        let site = if n % 2 == 0 { &self.healthy } else { &self.broken };
        site.open().await
    }
}

#[tokio::test]
async fn builtin_suite_passes_in_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let site = SimulatedSite::music_app(BASE);
    let runner = Runner::new(Arc::new(site.clone()), config(4, 1, dir.path().to_path_buf()));

    let scenarios = Scenario::builtin().unwrap();
    let suite = runner.run_all(&scenarios).await;

    assert!(suite.success());
    assert_eq!(suite.total, 4);
    assert_eq!(suite.passed, 4);
    assert_eq!(site.sessions_opened(), 4);

    let names: Vec<&str> = suite.results.iter().map(|r| r.name.as_str()).collect();
    let expected: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn failures_do_not_stop_the_suite() {
    let dir = tempfile::tempdir().unwrap();
    let site = SimulatedSite::builder(BASE)
        .page(
            "/",
            vec![
                SimLink::to("/settings"),
                SimLink::misrouted("/playlists", "/generator"),
                SimLink::dead("/generator"),
            ],
        )
        .page("/settings", vec![SimLink::to("/library")])
        .build();
    let runner = Runner::new(Arc::new(site), config(1, 1, dir.path().to_path_buf()));

    let suite = runner.run_all(&Scenario::builtin().unwrap()).await;

    assert!(!suite.success());
    assert_eq!(suite.passed, 2);
    assert_eq!(suite.failed, 2);

    let playlists = &suite.results[1];
    assert_eq!(playlists.status, ScenarioStatus::Failed);
    assert_eq!(playlists.failure, Some(FailureKind::AssertionMismatch));
    assert_eq!(playlists.location.as_deref(), Some("http://127.0.0.1:1420/generator"));
    assert_eq!(playlists.expected.as_deref(), Some("/.*playlists/"));

    let generator = &suite.results[2];
    assert_eq!(generator.failure, Some(FailureKind::NavigationTimeout));

    let library = &suite.results[3];
    assert!(library.success());
    assert_eq!(library.location.as_deref(), Some("http://127.0.0.1:1420/library"));
}

#[tokio::test]
async fn repeat_uses_fresh_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let site = SimulatedSite::music_app(BASE);
    let runner = Runner::new(Arc::new(site.clone()), config(2, 3, dir.path().to_path_buf()));

    let suite = runner.run_tagged(&Scenario::builtin().unwrap(), "smoke").await;

    assert_eq!(suite.total, 3);
    assert!(suite.results.iter().all(|r| r.attempts == 3 && r.passes == 3));
    assert_eq!(site.sessions_opened(), 9);
}

#[tokio::test]
async fn disagreeing_repetitions_are_flaky() {
    let dir = tempfile::tempdir().unwrap();
    let factory = AlternatingSite {
        healthy: SimulatedSite::music_app(BASE),
        broken: SimulatedSite::builder(BASE)
            .page("/", vec![SimLink::dead("/settings")])
            .build(),
        opened: AtomicUsize::new(0),
    };
    let runner = Runner::new(Arc::new(factory), config(1, 2, dir.path().to_path_buf()));

    let suite = runner
        .run_named(&Scenario::builtin().unwrap(), "navigate-to-settings")
        .await
        .unwrap();

    assert_eq!(suite.flaky, 1);
    assert!(!suite.success());
    let result = &suite.results[0];
    assert_eq!(result.status, ScenarioStatus::Flaky);
    assert_eq!(result.passes, 1);
    assert_eq!(result.failure, Some(FailureKind::NavigationTimeout));
}

#[tokio::test]
async fn unknown_name_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(
        Arc::new(SimulatedSite::music_app(BASE)),
        config(1, 1, dir.path().to_path_buf()),
    );
    assert!(runner
        .run_named(&Scenario::builtin().unwrap(), "no-such-scenario")
        .await
        .is_err());
}

#[tokio::test]
async fn results_are_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(
        Arc::new(SimulatedSite::music_app(BASE)),
        config(1, 1, dir.path().join("out")),
    );

    let suite = runner.run_all(&Scenario::builtin().unwrap()).await;
    let path = runner.write_results(&suite).unwrap();

    assert_eq!(path, dir.path().join("out").join("navcheck-results.json"));
    let written: SuiteResult =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.passed, 4);
    assert_eq!(written.results[3].name, "settings-then-library");
}

//! Suite runner: executes scenarios in isolated sessions and aggregates results

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{FailureKind, NavResult};
use crate::page::SessionFactory;
use crate::scenario::Scenario;
use crate::verifier::{NavigationVerifier, Timeouts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    /// Repetitions from fresh sessions disagreed
    Flaky,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Passed => "passed",
            ScenarioStatus::Failed => "failed",
            ScenarioStatus::Flaky => "flaky",
        }
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub failure: Option<FailureKind>,
    pub error: Option<String>,
    /// Final location on success, or the location observed at failure
    pub location: Option<String>,
    pub expected: Option<String>,
    pub attempts: usize,
    pub passes: usize,
    pub duration_ms: u64,
}

impl ScenarioResult {
    pub fn success(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub flaky: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    /// A suite in which nothing ran
    pub fn empty() -> Self {
        Self {
            started_at: Utc::now(),
            total: 0,
            passed: 0,
            failed: 0,
            flaky: 0,
            duration_ms: 0,
            results: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0 && self.flaky == 0
    }
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub timeouts: Timeouts,
    pub jobs: usize,
    pub repeat: usize,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            jobs: 1,
            repeat: 1,
            output_dir: PathBuf::from("navcheck-results"),
        }
    }
}

/// Outcome of one fresh-session run of a scenario
struct Attempt {
    outcome: NavResult<String>,
}

/// Runs scenarios against sessions handed out by a [`SessionFactory`]
#[derive(Clone)]
pub struct Runner {
    factory: Arc<dyn SessionFactory>,
    config: RunnerConfig,
}

impl Runner {
    pub fn new(factory: Arc<dyn SessionFactory>, config: RunnerConfig) -> Self {
        Self { factory, config }
    }

    /// Run every scenario
    pub async fn run_all(&self, scenarios: &[Scenario]) -> SuiteResult {
        self.run_scenarios(scenarios.to_vec()).await
    }

    /// Run scenarios carrying `tag`
    pub async fn run_tagged(&self, scenarios: &[Scenario], tag: &str) -> SuiteResult {
        let filtered = Scenario::filter_by_tag(scenarios, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_scenarios(filtered).await
    }

    /// Run a specific scenario by name
    pub async fn run_named(&self, scenarios: &[Scenario], name: &str) -> NavResult<SuiteResult> {
        let selected = Scenario::select(scenarios, Some(name), None)?;
        Ok(self.run_scenarios(selected).await)
    }

    /// Run scenarios with at most `jobs` in flight, reporting in input order
    pub async fn run_scenarios(&self, scenarios: Vec<Scenario>) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let jobs = self.config.jobs.max(1);

        info!("Running {} scenario(s) with {} job(s)...", scenarios.len(), jobs);

        let semaphore = Arc::new(Semaphore::new(jobs));
        let mut set = JoinSet::new();

        for (index, scenario) in scenarios.iter().cloned().enumerate() {
            let runner = self.clone();
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, runner.run_scenario(&scenario).await)
            });
        }

        let mut slots: Vec<Option<ScenarioResult>> = vec![None; scenarios.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => error!("Scenario task failed: {}", e),
            }
        }

        let results: Vec<ScenarioResult> = slots
            .into_iter()
            .zip(&scenarios)
            .map(|(slot, scenario)| {
                slot.unwrap_or_else(|| ScenarioResult {
                    name: scenario.name.clone(),
                    status: ScenarioStatus::Failed,
                    failure: Some(FailureKind::Infrastructure),
                    error: Some("scenario task aborted".to_string()),
                    location: None,
                    expected: expected_of(scenario),
                    attempts: 0,
                    passes: 0,
                    duration_ms: 0,
                })
            })
            .collect();

        let count = |status| results.iter().filter(|r| r.status == status).count();
        let passed = count(ScenarioStatus::Passed);
        let failed = count(ScenarioStatus::Failed);
        let flaky = count(ScenarioStatus::Flaky);
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed, {} flaky ({} ms)",
            passed, failed, flaky, duration_ms
        );

        SuiteResult {
            started_at,
            total: results.len(),
            passed,
            failed,
            flaky,
            duration_ms,
            results,
        }
    }

    /// Run one scenario `repeat` times, each from a fresh session
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        let repeat = self.config.repeat.max(1);
        let verifier = NavigationVerifier::new(self.config.timeouts.clone());

        let mut attempts = Vec::with_capacity(repeat);
        for attempt in 1..=repeat {
            debug!("Running {} (attempt {}/{})", scenario.name, attempt, repeat);
            attempts.push(self.run_once(&verifier, scenario).await);
        }

        let passes = attempts.iter().filter(|a| a.outcome.is_ok()).count();
        let status = if passes == attempts.len() {
            ScenarioStatus::Passed
        } else if passes == 0 {
            ScenarioStatus::Failed
        } else {
            ScenarioStatus::Flaky
        };

        let first_failure = attempts.iter().find_map(|a| a.outcome.as_ref().err());
        let (failure, error, location) = match first_failure {
            Some(e) => (Some(e.kind()), Some(e.to_string()), e.location().map(String::from)),
            None => (
                None,
                None,
                attempts.last().and_then(|a| a.outcome.as_ref().ok().cloned()),
            ),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match status {
            ScenarioStatus::Passed => info!("✓ {} ({} ms)", scenario.name, duration_ms),
            ScenarioStatus::Failed => error!(
                "✗ {} - {}",
                scenario.name,
                error.as_deref().unwrap_or("unknown error")
            ),
            ScenarioStatus::Flaky => warn!(
                "~ {} - passed {}/{} runs: {}",
                scenario.name,
                passes,
                attempts.len(),
                error.as_deref().unwrap_or("unknown error")
            ),
        }

        ScenarioResult {
            name: scenario.name.clone(),
            status,
            failure,
            error,
            location,
            expected: expected_of(scenario),
            attempts: attempts.len(),
            passes,
            duration_ms,
        }
    }

    async fn run_once(&self, verifier: &NavigationVerifier, scenario: &Scenario) -> Attempt {
        let mut session = match self.factory.open().await {
            Ok(session) => session,
            Err(e) => return Attempt { outcome: Err(e) },
        };

        let outcome = verifier
            .run(session.as_mut(), scenario)
            .await
            .map(|verdict| verdict.location);

        if let Err(e) = session.close().await {
            warn!("Failed to close session for {}: {}", scenario.name, e);
        }

        Attempt { outcome }
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> NavResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("navcheck-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn expected_of(scenario: &Scenario) -> Option<String> {
    scenario.final_expectation().map(|p| p.to_string())
}

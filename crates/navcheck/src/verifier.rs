//! Click-then-assert navigation verification
//!
//! A scenario moves a session through
//! `Unloaded -> Loaded(start_path) -> Activated(selector) -> Settled(location)`,
//! re-entering `Activated` for every further hop. The run ends at the final
//! settle or at the first error.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::error::{NavError, NavResult};
use crate::page::PageSession;
use crate::pattern::UrlPattern;
use crate::scenario::{Hop, Scenario};

/// Bounds on every wait the verifier performs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// How long an anchor may take to appear, and a click to change the location
    pub navigation_ms: u64,

    /// How long the settled location may take to match the expectation
    pub assertion_ms: u64,

    /// Delay between location polls
    pub poll_interval_ms: u64,

    /// How long loading the start path may take
    pub load_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 5000,
            assertion_ms: 5000,
            poll_interval_ms: 50,
            load_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded(String),
    Activated(String),
    Settled(String),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unloaded => write!(f, "unloaded"),
            SessionState::Loaded(path) => write!(f, "loaded({})", path),
            SessionState::Activated(selector) => write!(f, "activated({})", selector),
            SessionState::Settled(location) => write!(f, "settled({})", location),
        }
    }
}

/// Outcome of a successful scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Location after the final hop settled
    pub location: String,

    /// Number of hops performed
    pub hops: usize,
}

pub struct NavigationVerifier {
    timeouts: Timeouts,
}

impl NavigationVerifier {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    /// Load the scenario's start path and verify each hop in order
    pub async fn run(&self, page: &mut dyn PageSession, scenario: &Scenario) -> NavResult<Verdict> {
        let mut state = SessionState::Unloaded;

        let load_ms = self.timeouts.load_ms;
        match timeout(Duration::from_millis(load_ms), page.goto(&scenario.start_path)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(NavError::LoadTimeout {
                    path: scenario.start_path.clone(),
                    timeout_ms: load_ms,
                })
            }
        }
        transition(&scenario.name, &mut state, SessionState::Loaded(scenario.start_path.clone()));

        let mut location = String::new();
        for hop in &scenario.steps {
            location = self.verify_hop(page, hop, &scenario.name, &mut state).await?;
        }

        Ok(Verdict {
            location,
            hops: scenario.steps.len(),
        })
    }

    /// Click the hop's anchor, wait for navigation, then check the expectation
    async fn verify_hop(
        &self,
        page: &mut dyn PageSession,
        hop: &Hop,
        scenario: &str,
        state: &mut SessionState,
    ) -> NavResult<String> {
        let selector = hop.href.selector();
        self.wait_for_anchor(page, &selector).await?;
        let before = page.location().await?;

        page.click(&selector).await?;
        transition(scenario, state, SessionState::Activated(selector.clone()));

        let navigation_ms = self.timeouts.navigation_ms;
        let location = match self
            .poll_location(page, navigation_ms, |location| location != before)
            .await?
        {
            Ok(location) => location,
            Err(location) => {
                return Err(NavError::NavigationTimeout {
                    selector,
                    location,
                    timeout_ms: navigation_ms,
                })
            }
        };

        let location = match &hop.expect {
            Some(expect) => self.assert_location(page, expect, location).await?,
            None => location,
        };

        transition(scenario, state, SessionState::Settled(location.clone()));
        Ok(location)
    }

    /// Poll the anchor count until at least one match has rendered.
    ///
    /// The location can update before the route's document does.
    async fn wait_for_anchor(&self, page: &mut dyn PageSession, selector: &str) -> NavResult<()> {
        let start = Instant::now();
        let limit = Duration::from_millis(self.timeouts.navigation_ms);
        let interval = Duration::from_millis(self.timeouts.poll_interval_ms.max(1));

        loop {
            if page.count(selector).await? > 0 {
                return Ok(());
            }
            if start.elapsed() >= limit {
                return Err(NavError::ElementNotFound {
                    selector: selector.to_string(),
                    location: page.location().await?,
                });
            }
            sleep(interval).await;
        }
    }

    async fn assert_location(
        &self,
        page: &mut dyn PageSession,
        expect: &UrlPattern,
        settled: String,
    ) -> NavResult<String> {
        if expect.is_match(&settled) {
            return Ok(settled);
        }

        self.poll_location(page, self.timeouts.assertion_ms, |location| expect.is_match(location))
            .await?
            .map_err(|actual| NavError::AssertionMismatch {
                expected: expect.to_string(),
                actual,
            })
    }

    /// Poll the location until `done` holds or `limit_ms` elapses.
    ///
    /// The inner result is `Ok` with the satisfying location, or `Err` with the
    /// last location observed before giving up.
    async fn poll_location<F>(
        &self,
        page: &mut dyn PageSession,
        limit_ms: u64,
        done: F,
    ) -> NavResult<Result<String, String>>
    where
        F: Fn(&str) -> bool,
    {
        let start = Instant::now();
        let limit = Duration::from_millis(limit_ms);
        let interval = Duration::from_millis(self.timeouts.poll_interval_ms.max(1));

        loop {
            let location = page.location().await?;
            if done(&location) {
                return Ok(Ok(location));
            }
            if start.elapsed() >= limit {
                return Ok(Err(location));
            }
            sleep(interval).await;
        }
    }
}

impl Default for NavigationVerifier {
    fn default() -> Self {
        Self::new(Timeouts::default())
    }
}

fn transition(scenario: &str, state: &mut SessionState, next: SessionState) {
    debug!("[{}] {} -> {}", scenario, state, next);
    *state = next;
}

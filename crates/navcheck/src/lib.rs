//! navcheck - browser-driven navigation verification
//!
//! This crate checks that clicking navigation links in a web application
//! lands on the expected routes:
//! - Parses declarative YAML navigation scenarios
//! - Attaches to, or spawns and health checks, the application under test
//! - Drives Playwright through a line-delimited JSON driver, one isolated
//!   browser per scenario run
//! - Verifies each click with bounded settle and assertion waits
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      navcheck (Rust)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Runner                                                     │
//! │    ├── SessionFactory::open() -> Box<dyn PageSession>       │
//! │    ├── NavigationVerifier::run(session, scenario)           │
//! │    │     ├── goto(start_path)                               │
//! │    │     └── per hop: count -> click -> settle -> assert    │
//! │    └── write_results(SuiteResult)                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, description, tags, start_path                  │
//! │    └── steps: [Hop { href, expect? }]                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod locator;
pub mod page;
pub mod pattern;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod server;
#[cfg(any(test, feature = "test-util"))]
pub mod sim;
pub mod verifier;

pub use error::{FailureKind, NavError, NavResult};
pub use locator::Locator;
pub use page::{PageSession, SessionFactory};
pub use pattern::UrlPattern;
pub use runner::{Runner, RunnerConfig, ScenarioResult, ScenarioStatus, SuiteResult};
pub use scenario::{Hop, Scenario};
pub use verifier::{NavigationVerifier, Timeouts, Verdict};

//! Error types for navigation verification

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("Element not found: {selector} (location: {location})")]
    ElementNotFound { selector: String, location: String },

    #[error("Navigation timeout: clicking {selector} did not navigate within {timeout_ms} ms (location: {location})")]
    NavigationTimeout {
        selector: String,
        location: String,
        timeout_ms: u64,
    },

    #[error("Assertion mismatch: expected location matching {expected}, got {actual}")]
    AssertionMismatch { expected: String, actual: String },

    #[error("Timeout loading {path} after {timeout_ms} ms")]
    LoadTimeout { path: String, timeout_ms: u64 },

    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Playwright not found. Install with: npx playwright install")]
    DriverNotFound,

    #[error("Playwright driver error: {0}")]
    Driver(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Invalid scenario '{name}': {reason}")]
    InvalidScenario { name: String, reason: String },

    #[error("Invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type NavResult<T> = Result<T, NavError>;

/// How a scenario failed, as reported in suite results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ElementNotFound,
    NavigationTimeout,
    AssertionMismatch,
    Infrastructure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ElementNotFound => "element_not_found",
            FailureKind::NavigationTimeout => "navigation_timeout",
            FailureKind::AssertionMismatch => "assertion_mismatch",
            FailureKind::Infrastructure => "infrastructure",
        }
    }
}

impl NavError {
    pub fn kind(&self) -> FailureKind {
        match self {
            NavError::ElementNotFound { .. } => FailureKind::ElementNotFound,
            NavError::NavigationTimeout { .. } => FailureKind::NavigationTimeout,
            NavError::AssertionMismatch { .. } => FailureKind::AssertionMismatch,
            _ => FailureKind::Infrastructure,
        }
    }

    /// The location observed when the failure happened, if the error carries one
    pub fn location(&self) -> Option<&str> {
        match self {
            NavError::ElementNotFound { location, .. } => Some(location),
            NavError::NavigationTimeout { location, .. } => Some(location),
            NavError::AssertionMismatch { actual, .. } => Some(actual),
            _ => None,
        }
    }
}

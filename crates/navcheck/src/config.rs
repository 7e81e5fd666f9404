//! navcheck configuration file

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NavError, NavResult};
use crate::playwright::{Browser, PlaywrightConfig};
use crate::server::ServerConfig;
use crate::verifier::Timeouts;

pub const DEFAULT_CONFIG_FILE: &str = "navcheck.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavcheckConfig {
    /// Directory of YAML scenarios (None = built-in scenarios)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenarios_dir: Option<PathBuf>,

    /// Output directory for results
    pub output_dir: PathBuf,

    /// Scenarios run at the same time
    pub jobs: usize,

    /// Fresh-session runs per scenario
    pub repeat: usize,

    pub browser: BrowserConfig,

    pub timeouts: Timeouts,

    pub server: ServerConfig,
}

impl Default for NavcheckConfig {
    fn default() -> Self {
        Self {
            scenarios_dir: None,
            output_dir: PathBuf::from("navcheck-results"),
            jobs: 1,
            repeat: 1,
            browser: BrowserConfig::default(),
            timeouts: Timeouts::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub kind: Browser,
    pub headless: bool,

    /// Directory whose `node_modules` provides Playwright
    pub project_dir: PathBuf,

    pub viewport: Viewport,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: Browser::Chromium,
            headless: true,
            project_dir: PathBuf::from("."),
            viewport: Viewport::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

impl NavcheckConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> NavResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> NavResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| NavError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> NavResult<()> {
        if self.jobs == 0 {
            return Err(NavError::Config("jobs must be at least 1".to_string()));
        }
        if self.repeat == 0 {
            return Err(NavError::Config("repeat must be at least 1".to_string()));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(NavError::Config("timeouts.poll_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Playwright settings for an application reachable at `base_url`
    pub fn playwright(&self, base_url: &str) -> PlaywrightConfig {
        PlaywrightConfig {
            base_url: base_url.to_string(),
            browser: self.browser.kind,
            headless: self.browser.headless,
            viewport_width: self.browser.viewport.width,
            viewport_height: self.browser.viewport.height,
            project_dir: self.browser.project_dir.clone(),
            request_timeout: Duration::from_millis(self.timeouts.load_ms + 5000),
            click_timeout: Duration::from_millis(self.timeouts.navigation_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = NavcheckConfig::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config.jobs, 1);
        assert_eq!(config.timeouts.navigation_ms, 5000);
        assert!(!config.server.spawns());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
jobs = 4

[browser]
kind = "firefox"

[timeouts]
navigation_ms = 1500

[server]
command = ["npm", "run", "dev"]
port_env = "VITE_PORT"
"#,
        )
        .unwrap();

        let config = NavcheckConfig::load(&path).unwrap();
        assert_eq!(config.jobs, 4);
        assert_eq!(config.browser.kind, Browser::Firefox);
        assert!(config.browser.headless);
        assert_eq!(config.timeouts.navigation_ms, 1500);
        assert_eq!(config.timeouts.assertion_ms, 5000);
        assert!(config.server.spawns());
        assert_eq!(config.server.port_env, "VITE_PORT");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);
        let config = NavcheckConfig {
            repeat: 3,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = NavcheckConfig::load(&path).unwrap();
        assert_eq!(loaded.repeat, 3);
        assert_eq!(loaded.server.base_url, "http://127.0.0.1:1420");
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "jobs = 0\n").unwrap();
        assert!(matches!(NavcheckConfig::load(&path), Err(NavError::Config(_))));
    }

    #[test]
    fn test_playwright_request_timeout_covers_load() {
        let config = NavcheckConfig::default();
        let pw = config.playwright("http://127.0.0.1:5173");
        assert_eq!(pw.base_url, "http://127.0.0.1:5173");
        assert_eq!(pw.request_timeout, Duration::from_millis(35_000));
    }

    #[test]
    fn test_playwright_click_bounded_by_navigation() {
        let mut config = NavcheckConfig::default();
        config.timeouts.navigation_ms = 1200;
        let pw = config.playwright("http://127.0.0.1:5173");
        assert_eq!(pw.click_timeout, Duration::from_millis(1200));
    }
}

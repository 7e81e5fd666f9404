//! Application server management - attaching to a running app, or spawning
//! and health checking one

use std::collections::BTreeMap;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{NavError, NavResult};

/// Configuration for the application under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of an already running application (attach mode)
    pub base_url: String,

    /// Command that starts the application (spawn mode when non-empty)
    pub command: Vec<String>,

    /// Environment variable the spawned command reads its port from
    pub port_env: String,

    /// Port to listen on (None = find free port)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Path polled until the application answers
    pub health_path: String,

    /// Timeout for application startup
    pub startup_timeout_secs: u64,

    /// Extra environment for the spawned command
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1420".to_string(),
            command: Vec::new(),
            port_env: "PORT".to_string(),
            port: None,
            health_path: "/".to_string(),
            startup_timeout_secs: 60,
            env: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    pub fn spawns(&self) -> bool {
        !self.command.is_empty()
    }
}

/// Handle to the application under test
pub struct ServerHandle {
    child: Option<Child>,
    base_url: String,
}

impl ServerHandle {
    /// Attach to the configured base URL or spawn the configured command
    pub async fn start(config: &ServerConfig) -> NavResult<Self> {
        if config.spawns() {
            Self::spawn(config).await
        } else {
            Self::attach(config).await
        }
    }

    /// Use an application that is already running
    pub async fn attach(config: &ServerConfig) -> NavResult<Self> {
        let handle = ServerHandle {
            child: None,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        };
        handle
            .wait_for_healthy(&config.health_path, Duration::from_secs(config.startup_timeout_secs))
            .await?;
        info!("Attached to application at {}", handle.base_url);
        Ok(handle)
    }

    /// Spawn the application command
    pub async fn spawn(config: &ServerConfig) -> NavResult<Self> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| NavError::ServerStartup("empty server command".to_string()))?;

        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning {} on port {}", program, port);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&config.env)
            .env(&config.port_env, port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            NavError::ServerStartup(format!("Failed to spawn {}: {}", program, e))
        })?;

        let handle = ServerHandle {
            child: Some(child),
            base_url,
        };

        // Dropping the handle on failure stops the child
        handle
            .wait_for_healthy(&config.health_path, Duration::from_secs(config.startup_timeout_secs))
            .await?;

        info!("Application is healthy at {}", handle.base_url);
        Ok(handle)
    }

    /// Wait for the application to answer on `health_path`
    async fn wait_for_healthy(&self, health_path: &str, timeout_duration: Duration) -> NavResult<()> {
        let health_url = format!("{}{}", self.base_url, health_path);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() || resp.status().is_redirection() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Health check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for application at {}...", self.base_url);
                    }
                    // Connection refused is expected while the app is starting
                    if !e.is_connect() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            if start.elapsed() >= timeout_duration {
                return Err(NavError::ServerHealthCheck(attempts));
            }
            sleep(Duration::from_millis(100)).await;
        }
    }

    /// Get the base URL for this application
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the application if this handle spawned it
    pub fn stop(&mut self) -> NavResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        info!("Stopping application (pid: {})", child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = child.kill();
        child.wait()?;

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Find a free port to use
fn find_free_port() -> NavResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

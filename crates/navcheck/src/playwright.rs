//! Playwright browser automation
//!
//! Each session runs its own `node` process hosting a small Playwright driver.
//! Rust sends one JSON request per line on the driver's stdin and reads one
//! JSON response per line from its stdout:
//!
//! ```text
//! > {"id":1,"cmd":"goto","path":"/"}
//! < {"id":1,"ok":true,"value":null}
//! > {"id":2,"cmd":"count","selector":"a[href=\"/settings\"]"}
//! < {"id":2,"ok":true,"value":1}
//! ```
//!
//! The driver announces itself with response id 0 once the browser is up.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{NavError, NavResult};
use crate::page::{PageSession, SessionFactory};

const DRIVER_JS: &str = r#"
const readline = require('readline');
const opts = JSON.parse(process.argv[2]);
const playwright = require(require.resolve('playwright', { paths: [process.cwd(), __dirname] }));

function send(msg) {
  process.stdout.write(JSON.stringify(msg) + '\n');
}

function message(e) {
  return String((e && e.message) || e);
}

(async () => {
  let browser;
  try {
    browser = await playwright[opts.browser].launch({ headless: opts.headless });
  } catch (e) {
    send({ id: 0, ok: false, error: message(e) });
    process.exit(1);
  }
  const context = await browser.newContext({
    viewport: { width: opts.width, height: opts.height },
  });
  const page = await context.newPage();
  page.setDefaultTimeout(opts.timeoutMs);
  send({ id: 0, ok: true, value: 'ready' });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let req;
    try {
      req = JSON.parse(line);
    } catch (e) {
      send({ id: -1, ok: false, error: 'malformed request: ' + message(e) });
      continue;
    }
    try {
      let value = null;
      switch (req.cmd) {
        case 'goto':
          await page.goto(new URL(req.path, opts.baseUrl).toString(), { waitUntil: 'load' });
          break;
        case 'count':
          try {
            value = await page.locator(req.selector).count();
          } catch (e) {
            if (!/context was destroyed|navigat/i.test(message(e))) throw e;
            value = 0;
          }
          break;
        case 'click':
          await page.click(req.selector, { noWaitAfter: true, timeout: opts.clickTimeoutMs });
          break;
        case 'url':
          value = page.url();
          break;
        case 'close':
          await context.close();
          await browser.close();
          send({ id: req.id, ok: true, value: null });
          process.exit(0);
        default:
          throw new Error('unknown command: ' + req.cmd);
      }
      send({ id: req.id, ok: true, value });
    } catch (e) {
      send({ id: req.id, ok: false, error: message(e), timeout: !!e && e.name === 'TimeoutError' });
    }
  }
  await browser.close();
})();
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(NavError::Config(format!("unknown browser: {}", other))),
        }
    }
}

/// Configuration for Playwright sessions
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Directory whose `node_modules` provides Playwright
    pub project_dir: PathBuf,

    /// Upper bound for any single driver request
    pub request_timeout: Duration,

    /// How long a click may wait for its anchor to become actionable
    pub click_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1420".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            project_dir: PathBuf::from("."),
            request_timeout: Duration::from_secs(35),
            click_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum DriverCommand<'a> {
    Goto { path: &'a str },
    Count { selector: &'a str },
    Click { selector: &'a str },
    Url,
    Close,
}

impl DriverCommand<'_> {
    fn name(&self) -> &'static str {
        match self {
            DriverCommand::Goto { .. } => "goto",
            DriverCommand::Count { .. } => "count",
            DriverCommand::Click { .. } => "click",
            DriverCommand::Url => "url",
            DriverCommand::Close => "close",
        }
    }
}

#[derive(Debug, Serialize)]
struct DriverRequest<'a> {
    id: i64,
    #[serde(flatten)]
    command: &'a DriverCommand<'a>,
}

#[derive(Debug, Deserialize)]
struct DriverResponse {
    id: i64,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
}

/// Hands out one Playwright-driven browser per session
pub struct PlaywrightFactory {
    config: PlaywrightConfig,
}

impl PlaywrightFactory {
    pub fn new(config: PlaywrightConfig) -> NavResult<Self> {
        Self::check_playwright_installed(&config)?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed(config: &PlaywrightConfig) -> NavResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(&config.project_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(NavError::DriverNotFound),
        }
    }
}

#[async_trait]
impl SessionFactory for PlaywrightFactory {
    async fn open(&self) -> NavResult<Box<dyn PageSession>> {
        let session = PlaywrightSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}

/// A browser context controlled through a Node.js Playwright driver
pub struct PlaywrightSession {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: i64,
    request_timeout: Duration,
    click_timeout: Duration,
    closed: bool,
    _script_dir: tempfile::TempDir,
}

impl PlaywrightSession {
    /// Spawn the driver and wait for the browser to come up
    pub async fn launch(config: &PlaywrightConfig) -> NavResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_JS)?;

        let options = serde_json::json!({
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "width": config.viewport_width,
            "height": config.viewport_height,
            "baseUrl": config.base_url,
            "timeoutMs": config.request_timeout.as_millis() as u64,
            "clickTimeoutMs": config.click_timeout.as_millis() as u64,
        });

        debug!("Launching {} driver: {}", config.browser.as_str(), script_path.display());

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .arg(options.to_string())
            .current_dir(&config.project_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NavError::Driver(format!("Failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| NavError::Driver("Failed to get driver stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| NavError::Driver("Failed to get driver stdout".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[driver] {}", line);
                }
            });
        }

        let mut session = Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            next_id: 1,
            request_timeout: config.request_timeout,
            click_timeout: config.click_timeout,
            closed: false,
            _script_dir: script_dir,
        };

        let ready = session.read_response(0, "launch").await?;
        if !ready.ok {
            let error = ready.error.unwrap_or_default();
            if error.contains("Cannot find module") {
                return Err(NavError::DriverNotFound);
            }
            return Err(NavError::Driver(format!("Browser launch failed: {}", error)));
        }

        info!("Browser session ready ({})", config.browser.as_str());
        Ok(session)
    }

    async fn request(&mut self, command: DriverCommand<'_>) -> NavResult<serde_json::Value> {
        let response = self.send(&command).await?;
        if response.ok {
            Ok(response.value)
        } else {
            Err(command_failed(&command, response))
        }
    }

    /// Write one request and wait for its response, successful or not
    async fn send(&mut self, command: &DriverCommand<'_>) -> NavResult<DriverResponse> {
        if self.closed {
            return Err(NavError::Driver("session is closed".to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_string(&DriverRequest { id, command })?;
        debug!("driver >>> {}", line);
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        self.read_response(id, command.name()).await
    }

    /// Read lines until the response for `id` arrives
    async fn read_response(&mut self, id: i64, what: &str) -> NavResult<DriverResponse> {
        loop {
            let line = match timeout(self.request_timeout, self.lines.next_line()).await {
                Ok(line) => line?,
                Err(_) => {
                    return Err(NavError::Driver(format!(
                        "No response to {} within {} ms",
                        what,
                        self.request_timeout.as_millis()
                    )))
                }
            };

            let line = line.ok_or_else(|| {
                NavError::Driver(format!("Driver exited while waiting for {}", what))
            })?;
            debug!("driver <<< {}", line);

            match serde_json::from_str::<DriverResponse>(&line) {
                Ok(response) if response.id == id => return Ok(response),
                Ok(response) => warn!("Ignoring driver response for id {}", response.id),
                Err(_) => debug!("[driver stdout] {}", line),
            }
        }
    }
}

fn command_failed(command: &DriverCommand<'_>, response: DriverResponse) -> NavError {
    NavError::Driver(format!(
        "{} failed: {}",
        command.name(),
        response.error.unwrap_or_else(|| "unknown error".to_string())
    ))
}

#[async_trait]
impl PageSession for PlaywrightSession {
    async fn goto(&mut self, path: &str) -> NavResult<()> {
        self.request(DriverCommand::Goto { path }).await?;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> NavResult<usize> {
        let value = self.request(DriverCommand::Count { selector }).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| NavError::Driver(format!("count returned {}", value)))
    }

    async fn click(&mut self, selector: &str) -> NavResult<()> {
        let command = DriverCommand::Click { selector };
        let response = self.send(&command).await?;
        if response.ok {
            return Ok(());
        }
        if !response.timeout {
            return Err(command_failed(&command, response));
        }

        // Present but never actionable (hidden, covered, disabled)
        Err(NavError::NavigationTimeout {
            selector: selector.to_string(),
            location: self.location().await?,
            timeout_ms: self.click_timeout.as_millis() as u64,
        })
    }

    async fn location(&mut self) -> NavResult<String> {
        let value = self.request(DriverCommand::Url).await?;
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| NavError::Driver(format!("url returned {}", value)))
    }

    async fn close(&mut self) -> NavResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.request(DriverCommand::Close).await;
        self.closed = true;
        let _ = self.child.wait().await;
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let command = DriverCommand::Click {
            selector: r#"a[href="/settings"]"#,
        };
        let json = serde_json::to_value(DriverRequest { id: 3, command: &command }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 3, "cmd": "click", "selector": "a[href=\"/settings\"]" })
        );

        let json = serde_json::to_value(DriverRequest { id: 4, command: &DriverCommand::Url }).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 4, "cmd": "url" }));
    }

    #[test]
    fn test_response_without_value() {
        let response: DriverResponse =
            serde_json::from_str(r#"{"id":2,"ok":false,"error":"Timeout 30000ms exceeded"}"#).unwrap();
        assert!(!response.ok);
        assert!(response.value.is_null());
        assert_eq!(response.error.as_deref(), Some("Timeout 30000ms exceeded"));
        assert!(!response.timeout);
    }

    #[test]
    fn test_click_timeout_response() {
        let response: DriverResponse = serde_json::from_str(
            r#"{"id":5,"ok":false,"error":"page.click: Timeout 5000ms exceeded","timeout":true}"#,
        )
        .unwrap();
        assert!(response.timeout);

        let command = DriverCommand::Click {
            selector: r#"a[href="/settings"]"#,
        };
        let err = command_failed(&command, response);
        assert!(err.to_string().contains("click failed"));
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("Firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert_eq!("chrome".parse::<Browser>().unwrap(), Browser::Chromium);
        assert!("lynx".parse::<Browser>().is_err());
    }
}

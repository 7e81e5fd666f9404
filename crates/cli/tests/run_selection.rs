//! `navcheck run` selection handling, exercised through the built binary

use std::process::Command;

use tempfile::TempDir;

fn navcheck(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_navcheck"));
    cmd.arg("--config")
        .arg(tmp.path().join("navcheck.toml"))
        .env_remove("NAVCHECK_BASE_URL")
        .env_remove("RUST_LOG")
        .current_dir(tmp.path());
    cmd
}

#[test]
fn empty_selection_keeps_json_stdout_parseable() {
    let tmp = TempDir::new().expect("create temp dir");

    let output = navcheck(&tmp)
        .args(["--format", "json", "run", "--tag", "no-such-tag"])
        .output()
        .expect("run navcheck");

    assert!(output.status.success(), "status: {}", output.status);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let suite: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is one JSON document");
    assert_eq!(suite["total"], 0);
    assert_eq!(suite["results"], serde_json::json!([]));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No scenarios matched the selection"));
}

#[test]
fn unknown_scenario_name_is_infrastructure_exit() {
    let tmp = TempDir::new().expect("create temp dir");

    let output = navcheck(&tmp)
        .args(["run", "--name", "no-such-scenario"])
        .output()
        .expect("run navcheck");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Scenario not found"));
}

//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_sanctuaire"))
        .args(args)
        .env("SANCTUAIRE_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

#[test]
fn test_steps_list() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["steps"]);
    assert_eq!(code, 0, "steps failed");
    assert!(stdout.contains("corps"));
    assert!(stdout.contains("resolution"));
}

#[test]
fn test_steps_json() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["steps", "--json"]);
    assert_eq!(code, 0, "steps --json failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let steps = parsed.as_array().unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0]["id"], "corps");
    assert_eq!(steps[0]["duration_secs"], 30);
}

#[test]
fn test_settings_duration_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["settings", "duration", "corps", "45"]);
    assert_eq!(code, 0, "settings duration failed");

    let (code, stdout, _) = run_cli(dir.path(), &["steps", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed[0]["duration_secs"], 45);
}

#[test]
fn test_settings_adjust_respects_minimum() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["settings", "adjust", "corps", "-10"]);
    assert_eq!(code, 0, "settings adjust failed");
    assert!(stdout.contains("0m 10s"));
}

#[test]
fn test_settings_unknown_step() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["settings", "duration", "nope", "60"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nope"));
}

#[test]
fn test_settings_show_json() {
    let dir = tempfile::tempdir().unwrap();
    let _ = run_cli(dir.path(), &["settings", "interval", "99999"]);
    let _ = run_cli(dir.path(), &["settings", "cue", "gong"]);
    let (code, stdout, _) = run_cli(dir.path(), &["settings", "show", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["cue_interval_ms"], 5000);
    assert_eq!(parsed["cue_kind"], "gong");
}

#[test]
fn test_journal_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["journal", "add", "Paix", "profonde"]);
    assert_eq!(code, 0, "journal add failed");

    let (code, stdout, _) = run_cli(dir.path(), &["journal", "list", "--json"]);
    assert_eq!(code, 0);
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["text"], "Paix profonde");

    let id = entries[0]["id"].as_i64().unwrap().to_string();
    let (code, _, _) = run_cli(dir.path(), &["journal", "delete", &id]);
    assert_eq!(code, 0);
    let (code, _, _) = run_cli(dir.path(), &["journal", "delete", &id]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_get_and_set() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "audio.player"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "paplay");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "display.keep_awake", "false"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "display.keep_awake"]);
    assert_eq!(stdout.trim(), "false");

    let (code, _, _) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_reading_welcome() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["reading", "--welcome"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Ap 3,20"));
}

#[test]
fn test_free_session_runs_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        dir.path(),
        &[
            "free",
            "--seconds",
            "1",
            "--silent",
            "--no-keep-awake",
            "--interval-ms",
            "100",
            "--json",
        ],
    );
    assert_eq!(code, 0, "free session failed");

    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(events.iter().any(|e| e["type"] == "step_expired"));
    let completed: Vec<_> = events
        .iter()
        .filter(|e| e["type"] == "session_completed")
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["reason"], "completed");
    assert_eq!(events.last().unwrap()["type"], "session_completed");
}

//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_fitpulse-cli"))
        .args(args)
        .env("FITPULSE_DATA_DIR", data_dir)
        .env_remove("FITPULSE_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// A fresh data directory with days anchored to UTC midnight.
fn utc_data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "steps.utc_offset_minutes", "0"]);
    assert_eq!(code, 0, "{stderr}");
    dir
}

/// Parse stdout holding one or more JSON documents.
fn json_values(stdout: &str) -> Vec<Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("stdout is not JSON")
}

fn write_samples(dir: &Path) -> String {
    let path = dir.join("samples.json");
    let now = chrono::Utc::now().date_naive();
    let day = |back: i64| {
        (now - chrono::Duration::days(back))
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .to_rfc3339()
    };
    let json = serde_json::json!({
        "name": "watch",
        "today": { "steps": 5230, "distanceM": 3218.688, "flightsClimbed": 4, "heartRateBpm": 72 },
        "dailyTotals": [
            { "date": day(2), "stepCount": 4000 },
            { "date": day(1), "stepCount": 5500 },
            { "date": day(40), "stepCount": 9999 }
        ]
    });
    std::fs::write(&path, json.to_string()).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_config_get_and_set() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.tick_ms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1000");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "set", "timer.tick_ms", "250"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "timer.tick_ms = 250");
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.tick_ms"]);
    assert_eq!(stdout.trim(), "250");
}

#[test]
fn test_config_list_section_and_clear_optional() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stdout, _) = run_cli(dir.path(), &["config", "set", "steps.utc_offset_minutes", "-300"]);
    assert_eq!(stdout.trim(), "steps.utc_offset_minutes = -300");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "list", "steps"]);
    assert_eq!(code, 0);
    let steps = serde_json::from_str::<Value>(&stdout).unwrap();
    assert_eq!(steps["utc_offset_minutes"], -300);
    assert_eq!(steps["sync_lookback_days"], 14);

    run_cli(dir.path(), &["config", "set", "steps.utc_offset_minutes", "none"]);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "steps.utc_offset_minutes"]);
    assert_eq!(stdout.trim(), "null");

    let (code, _, _) = run_cli(dir.path(), &["config", "list", "alarms"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "timer.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");
}

#[test]
fn test_timer_presets() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "presets"]);
    assert_eq!(code, 0);
    assert_eq!(serde_json::from_str::<Value>(&stdout).unwrap(), serde_json::json!([30, 45, 60]));
}

#[test]
fn test_timer_rejects_off_grid_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["timer", "run", "12"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");

    let (code, _, _) = run_cli(dir.path(), &["timer", "run", "--preset", "7"]);
    assert_eq!(code, 1);
}

#[test]
fn test_timer_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    for (key, value) in [("timer.tick_ms", "10"), ("timer.paused_poll_ms", "5"), ("timer.alarm", "false")] {
        let (code, _, stderr) = run_cli(dir.path(), &["config", "set", key, value]);
        assert_eq!(code, 0, "{stderr}");
    }

    let (code, stdout, stderr) = run_cli(dir.path(), &["timer", "run", "10", "--quiet"]);
    assert_eq!(code, 0, "{stderr}");
    let events = json_values(&stdout);
    assert_eq!(events.len(), 2, "{stdout}");
    assert_eq!(events[0]["type"], "CountdownStarted");
    assert_eq!(events[0]["total_secs"], 10);
    assert_eq!(events[1]["type"], "CountdownCompleted");
    assert_eq!(events[1]["run_id"], events[0]["run_id"]);
}

#[test]
fn test_steps_record_overwrites_same_day() {
    let dir = utc_data_dir();
    let (code, stdout, stderr) =
        run_cli(dir.path(), &["steps", "record", "3000", "--date", "2025-01-02"]);
    assert_eq!(code, 0, "{stderr}");
    let first = json_values(&stdout).remove(0);
    assert_eq!(first["type"], "StepsRecorded");
    assert_eq!(first["inserted"], true);

    let (_, stdout, _) = run_cli(
        dir.path(),
        &["steps", "record", "4500", "--date", "2025-01-02T18:30:00Z"],
    );
    let second = json_values(&stdout).remove(0);
    assert_eq!(second["inserted"], false);
    assert_eq!(second["record_id"], first["record_id"]);
    assert_eq!(second["step_count"], 4500.0);

    let (_, stdout, _) = run_cli(dir.path(), &["steps", "history", "--json"]);
    let history = serde_json::from_str::<Value>(&stdout).unwrap();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["stepCount"], 4500.0);
    assert_eq!(history[0]["date"], "2025-01-02T00:00:00Z");
}

#[test]
fn test_steps_record_rejects_negative() {
    let dir = utc_data_dir();
    let (code, _, _) = run_cli(dir.path(), &["steps", "record", "--", "-5"]);
    assert_eq!(code, 1);
    let (_, stdout, _) = run_cli(dir.path(), &["steps", "history", "--json"]);
    assert_eq!(serde_json::from_str::<Value>(&stdout).unwrap(), serde_json::json!([]));
}

#[test]
fn test_steps_sync_and_history() {
    let dir = utc_data_dir();
    let samples = write_samples(dir.path());

    let (code, stdout, stderr) = run_cli(dir.path(), &["steps", "sync", "--samples", &samples]);
    assert_eq!(code, 0, "{stderr}");
    let event = json_values(&stdout).remove(0);
    assert_eq!(event["type"], "StepsReconciled");
    assert_eq!(event["inserted"], 2);
    assert_eq!(event["updated"], 0);

    // Same export again only updates.
    let (_, stdout, _) = run_cli(dir.path(), &["steps", "sync", "--samples", &samples]);
    let event = json_values(&stdout).remove(0);
    assert_eq!(event["inserted"], 0);
    assert_eq!(event["updated"], 2);

    let (_, stdout, _) = run_cli(dir.path(), &["steps", "history", "--json"]);
    let history = serde_json::from_str::<Value>(&stdout).unwrap();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["stepCount"], 5500.0);
    assert_eq!(history[0]["delta"], 1500.0);
    assert!(history[1]["delta"].is_null());
}

#[test]
fn test_steps_sync_outside_window_is_skipped() {
    let dir = utc_data_dir();
    let samples = write_samples(dir.path());
    let (code, stdout, _) = run_cli(
        dir.path(),
        &["steps", "sync", "--samples", &samples, "--days", "0"],
    );
    assert_eq!(code, 0);
    let event = json_values(&stdout).remove(0);
    assert_eq!(event["type"], "StepSyncSkipped");
    assert_eq!(event["source"], "watch");
}

#[test]
fn test_steps_reset() {
    let dir = utc_data_dir();
    run_cli(dir.path(), &["steps", "record", "100", "--date", "2025-03-01"]);
    let (code, _, _) = run_cli(dir.path(), &["steps", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["steps", "history"]);
    assert!(stdout.contains("No step history yet."));
}

#[test]
fn test_metrics_json() {
    let dir = tempfile::tempdir().unwrap();
    let samples = write_samples(dir.path());
    let (code, stdout, stderr) = run_cli(dir.path(), &["metrics", "--samples", &samples, "--json"]);
    assert_eq!(code, 0, "{stderr}");
    let metrics = serde_json::from_str::<Value>(&stdout).unwrap();
    assert_eq!(metrics["steps"], 5230.0);
    assert_eq!(metrics["heart_rate_bpm"], 72.0);

    let (_, stdout, _) = run_cli(dir.path(), &["metrics", "--samples", &samples]);
    assert!(stdout.contains("2.00 mi"), "{stdout}");
}

#[test]
fn test_profile_set_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stdout, _) = run_cli(dir.path(), &["profile", "show"]);
    let profile = serde_json::from_str::<Value>(&stdout).unwrap();
    assert_eq!(profile["name"], "Guest");
    assert!(profile["bmi"].is_null());

    for (field, value) in [("heightFeet", "5"), ("heightInches", "10"), ("weightLbs", "170")] {
        let (code, _, stderr) = run_cli(dir.path(), &["profile", "set", field, value]);
        assert_eq!(code, 0, "{stderr}");
    }
    let (_, stdout, _) = run_cli(dir.path(), &["profile", "show"]);
    let profile = serde_json::from_str::<Value>(&stdout).unwrap();
    assert_eq!(profile["bmi"], 24.4);

    let (code, _, _) = run_cli(dir.path(), &["profile", "set", "heightInches", "12"]);
    assert_eq!(code, 1);
}

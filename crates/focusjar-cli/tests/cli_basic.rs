//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusjar"))
        .args(args)
        .env("FOCUSJAR_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_plan_alternates_kinds() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["plan", "add", "read"]);
    run_ok(dir.path(), &["plan", "add", "write"]);

    let planned = json(&run_ok(dir.path(), &["plan", "list", "--json"]));
    let planned = planned.as_array().unwrap();
    assert_eq!(planned.len(), 2);
    assert_eq!(planned[0]["type"], "input");
    assert_eq!(planned[1]["type"], "output");

    let id = planned[0]["id"].as_i64().unwrap().to_string();
    run_ok(dir.path(), &["plan", "remove", &id]);
    let planned = json(&run_ok(dir.path(), &["plan", "list", "--json"]));
    assert_eq!(planned[0]["text"], "write");
    assert_eq!(planned[0]["type"], "input");
}

#[test]
fn test_blank_task_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["plan", "add", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_timer_survives_between_invocations() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["plan", "add", "deep work"]);

    let started = json(&run_ok(dir.path(), &["timer", "start"]));
    assert_eq!(started["type"], "SessionStarted");
    assert_eq!(started["duration_secs"], 1800);

    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["state"], "running");
    assert_eq!(status["active_task"]["text"], "deep work");

    let (_, _, code) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 1);

    let paused = json(&run_ok(dir.path(), &["timer", "pause"]));
    assert_eq!(paused["type"], "SessionPaused");
    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["state"], "paused");

    run_ok(dir.path(), &["timer", "cancel"]);
    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["state"], "idle");
    assert_eq!(status["planned"], 1);
}

#[test]
fn test_pause_when_idle_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no running session"));
}

#[test]
fn test_sync_roundtrip_between_data_dirs() {
    let phone = tempfile::tempdir().unwrap();
    let laptop = tempfile::tempdir().unwrap();
    run_ok(phone.path(), &["goal", "set", "Write the book"]);
    run_ok(phone.path(), &["plan", "add", "outline chapter 3"]);

    let code = run_ok(phone.path(), &["sync", "export", "--code"]);
    let code = code.trim();

    let (_, stderr, exit) = run_cli(laptop.path(), &["sync", "import", code]);
    assert_eq!(exit, 1);
    assert!(stderr.contains("confirmed"));

    let imported = json(&run_ok(laptop.path(), &["sync", "import", code, "--yes"]));
    assert_eq!(imported["type"], "SyncImported");
    assert_eq!(imported["planned"], 1);
    assert_eq!(run_ok(laptop.path(), &["goal", "show"]).trim(), "Write the book");
}

#[test]
fn test_sync_import_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["sync", "import", "%%%", "--yes"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid sync code"));
}

#[test]
fn test_jar_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let jar = json(&run_ok(dir.path(), &["jar", "list", "--json"]));
    assert_eq!(jar["balance"], 0);
    assert_eq!(jar["completed"].as_array().unwrap().len(), 0);

    let (_, stderr, code) = run_cli(dir.path(), &["jar", "sell"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("empty"));
}

#[test]
fn test_jar_counts_completed_by_kind() {
    let dir = tempfile::tempdir().unwrap();
    let payload = r#"{"mainTask":"","plannedTasks":[],"completedTasks":[
        {"id":1,"type":"input","text":"read"},
        {"id":2,"type":"output","text":"write"},
        {"id":3,"type":"input","text":"listen"}
    ]}"#;
    run_ok(dir.path(), &["sync", "import", payload, "--yes"]);

    let jar = json(&run_ok(dir.path(), &["jar", "list", "--json"]));
    assert_eq!(jar["consume"], 2);
    assert_eq!(jar["produce"], 1);
    assert_eq!(jar["completed"].as_array().unwrap().len(), 3);

    let text = run_ok(dir.path(), &["jar", "list"]);
    assert!(text.contains("Consume: 2  Produce: 1"));
}

#[test]
fn test_invalid_config_is_reported_and_defaults_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[session\nlength_min = ").unwrap();

    let (stdout, stderr, code) = run_cli(dir.path(), &["config", "get", "session.length_min"]);
    assert_eq!(code, 0, "{stderr}");
    assert_eq!(stdout.trim(), "30");
    assert!(stderr.contains("invalid config"), "{stderr}");
}

#[test]
fn test_plant_for_fixed_week() {
    let dir = tempfile::tempdir().unwrap();
    let plant = json(&run_ok(dir.path(), &["plant", "--week", "2024-01-10", "--json"]));
    assert_eq!(plant["week"], "2024-01-07");
    assert_eq!(plant["leaf"], 3);
    assert_eq!(plant["flower"], 2);
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "session.length_min"]).trim(), "30");
    run_ok(dir.path(), &["config", "set", "session.length_min", "25"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "session.length_min"]).trim(), "25");

    run_ok(dir.path(), &["plan", "add", "short one"]);
    let started = json(&run_ok(dir.path(), &["timer", "start"]));
    assert_eq!(started["duration_secs"], 1500);

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "session.length_min", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_advise_without_endpoint_is_permissive() {
    let dir = tempfile::tempdir().unwrap();
    let resp = json(&run_ok(dir.path(), &["advise", "read a paper"]));
    assert_eq!(resp["isRelevant"], true);
    assert_eq!(resp["suggestedText"], "read a paper");
}

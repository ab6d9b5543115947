use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("routine-{nanos}-{name}"))
}

fn run(store_dir: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_routine"))
        .args(args)
        .env("ROUTINE_STORE_DIR", store_dir)
        .env("ROUTINE_CONFIG_PATH", store_dir.join("missing-config.json"))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run routine")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn save_records_snapshot_for_today() {
    let dir = temp_path("save");
    run(&dir, &["toggle", "run"]);
    let saved = run(&dir, &["save", "--json"]);
    let history = run(&dir, &["history", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    let saved = json_stdout(&saved);
    let date = saved["date"].as_str().unwrap().to_string();
    assert_eq!(date.len(), 10);

    let history = json_stdout(&history);
    let snapshot = &history[date.as_str()];
    assert_eq!(snapshot["morningProgress"], 17);
    assert_eq!(snapshot["eveningProgress"], 0);
    assert_eq!(snapshot["morningTasks"].as_array().unwrap().len(), 6);
    assert!(snapshot["completedAt"].as_str().is_some());
}

#[test]
fn history_is_empty_for_new_store() {
    let dir = temp_path("history-empty");
    let output = run(&dir, &["history"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No saved days yet"));
}

#[test]
fn state_file_uses_versioned_envelope() {
    let dir = temp_path("envelope");
    let output = run(&dir, &["toggle", "run"]);
    let content = std::fs::read_to_string(dir.join("routine-storage.json"));
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stored: Value = serde_json::from_str(&content.expect("state file written")).unwrap();
    assert_eq!(stored["version"], 1);
    assert_eq!(stored["state"]["finishBy"], "09:00");
    assert_eq!(stored["state"]["morningProgress"], 17);
}

#[test]
fn corrupt_state_falls_back_to_templates() {
    let dir = temp_path("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("routine-storage.json"), "{not json").unwrap();
    let output = run(&dir, &["status", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    let status = json_stdout(&output);
    assert_eq!(status["finishBy"], "09:00");
    assert_eq!(status["morning"]["total"], 6);
}

#[test]
fn wipe_restores_defaults() {
    let dir = temp_path("wipe");
    run(&dir, &["finish-by", "07:00"]);
    let wiped = run(&dir, &["wipe", "--json"]);
    let status = run(&dir, &["status", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(json_stdout(&wiped)["wiped"], true);
    assert_eq!(json_stdout(&status)["finishBy"], "09:00");
}

use std::process::{Command, Output};
use std::{env, fs, path::PathBuf};

use serde_json::Value;
use tempfile::tempdir;

fn cli_bin_path() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_orchard-cli") {
        return PathBuf::from(path);
    }
    if let Ok(path) = env::var("CARGO_BIN_EXE_orchard_cli") {
        return PathBuf::from(path);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .expect("workspace root");
    let bin_name = if cfg!(windows) {
        "orchard-cli.exe"
    } else {
        "orchard-cli"
    };
    let fallback = workspace_root.join("target").join("debug").join(bin_name);
    assert!(
        fallback.exists(),
        "orchard-cli binary not found at {}",
        fallback.display()
    );
    fallback
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run(args: &[&str]) -> Output {
    Command::new(cli_bin_path())
        .args(args)
        .env_remove("ORCHARD_GROWTH_ACCRUAL")
        .env_remove("ORCHARD_WEEKLY_GOAL")
        .env_remove("ORCHARD_CATALOG")
        .output()
        .expect("run orchard-cli")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout must be JSON")
}

#[test]
fn convert_process_contract_returns_inventory_and_stage() {
    let json = stdout_json(&run(&["convert", "1564"]));
    assert_eq!(json["inventory"]["total_base_units"], 156);
    assert_eq!(json["inventory"]["tier1_count"], 1);
    assert_eq!(json["inventory"]["tier4_count"], 1);
    assert_eq!(json["stage"], 4);
}

#[test]
fn convert_process_contract_rejects_negative_points_with_error_payload() {
    let output = run(&["convert", "-1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let payload_line = stderr
        .lines()
        .find(|line| line.trim_start().starts_with('{'))
        .expect("error payload line");
    let payload: Value = serde_json::from_str(payload_line).expect("error payload JSON");
    assert_eq!(payload["code"], "INVALID_INPUT");
    assert_eq!(payload["operation"], "convert");
}

#[test]
fn grow_process_contract_saturates_at_one_hundred() {
    let json = stdout_json(&run(&["grow", "98", "25"]));
    assert_eq!(json["growth_level"], 100);
    assert_eq!(json["saturated"], true);
}

#[test]
fn grow_process_contract_carries_remainders_in_cumulative_mode() {
    let cumulative = stdout_json(&run(&["grow", "1", "3", "4", "--mode", "cumulative"]));
    assert_eq!(cumulative["mode"], "cumulative");
    assert_eq!(cumulative["growth_level"], 2);
    assert_eq!(cumulative["growth_carry"], 2);

    let per_event = stdout_json(&run(&["grow", "1", "3", "4", "--mode", "per-event"]));
    assert_eq!(per_event["mode"], "per_event");
    assert_eq!(per_event["growth_level"], 1);
}

#[test]
fn grow_process_contract_rejects_negative_events_with_error_payload() {
    let output = run(&["grow", "1", "-5"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("INVALID_INPUT"));
}

#[test]
fn progress_process_contract_reads_counter_file() {
    let root = tempdir().expect("tempdir");
    let counters = root.path().join("counters.json");
    fs::write(&counters, r#"{"completed_task_count": 4}"#).expect("write counters");

    let json = stdout_json(&run(&[
        "progress",
        "tasks_10",
        "--counters",
        counters.to_str().expect("counters path"),
    ]));
    assert_eq!(json["progress"]["status"], "in_progress");
    assert_eq!(json["progress"]["current"], 4);
    assert_eq!(json["percent"], 40);

    let strict = run(&[
        "progress",
        "mystery",
        "--strict",
        "--counters",
        counters.to_str().expect("counters path"),
    ]);
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("UNKNOWN_ACHIEVEMENT_CONDITION"));
}

#[test]
fn replay_process_contract_reaches_first_red_apple() {
    let events = fixture_path("replay_events.json");
    let json = stdout_json(&run(&[
        "replay",
        events.to_str().expect("events path"),
    ]));

    assert_eq!(json["events_applied"], 4);
    let user = &json["users"][0];
    assert_eq!(user["user_id"], "u1");
    assert_eq!(user["progress"]["point_total"], 11);
    assert_eq!(user["progress"]["growth_level"], 3);
    assert_eq!(user["progress"]["stage"], 1);
    assert_eq!(user["progress"]["inventory"]["tier1_count"], 1);
    assert_eq!(user["displayed"], user["progress"]);
    assert_eq!(user["current_streak_days"], 1);
}

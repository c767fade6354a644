//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway home
//! directory and verify outputs.

mod common;

use common::{json_lines, run_cli_failure, run_cli_success};
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseRow {
    id: String,
    color_theme: String,
    steps: Steps,
}

#[derive(Debug, Deserialize)]
struct Steps {
    inhale: u32,
    hold1: u32,
    exhale: u32,
    hold2: u32,
}

fn home() -> TempDir {
    TempDir::new().expect("temp home")
}

#[test]
fn test_exercises_list_json() {
    let home = home();
    let stdout = run_cli_success(home.path(), &["exercises", "list", "--json"]);
    let rows: Vec<ExerciseRow> = serde_json::from_str(&stdout).expect("exercise list JSON");
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["box-breathing", "4-7-8", "deep-calm", "energizing"]);
    assert_eq!(rows[3].color_theme, "success");
}

#[test]
fn test_exercises_list_plain() {
    let home = home();
    let stdout = run_cli_success(home.path(), &["exercises", "list"]);
    assert_eq!(stdout.lines().count(), 4);
    let four_seven_eight = stdout
        .lines()
        .find(|l| l.starts_with("4-7-8"))
        .expect("4-7-8 row");
    // 60s / 19s cycle
    assert!(four_seven_eight.contains(" 3.2 bpm"), "{four_seven_eight}");
    assert!(stdout.contains("15.0 bpm"));
}

#[test]
fn test_exercises_show() {
    let home = home();
    let stdout = run_cli_success(home.path(), &["exercises", "show", "4-7-8"]);
    let row: ExerciseRow = serde_json::from_str(&stdout).expect("exercise JSON");
    let s = row.steps;
    assert_eq!((s.inhale, s.hold1, s.exhale, s.hold2), (4, 7, 8, 0));
}

#[test]
fn test_exercises_show_unknown_fails() {
    let home = home();
    let stderr = run_cli_failure(home.path(), &["exercises", "show", "wim-hof"]);
    assert!(stderr.contains("Exercise not found: wim-hof"));
}

#[test]
fn test_simulate_four_seven_eight() {
    let home = home();
    let stdout = run_cli_success(
        home.path(),
        &[
            "session", "simulate", "--pattern", "4-7-8", "--minutes", "1", "--seconds", "19",
        ],
    );
    let lines = json_lines(&stdout);
    assert_eq!(lines[0]["type"], "session_started");
    assert_eq!(lines[0]["remaining_secs"], 60);

    let changes: Vec<(&str, u64)> = lines
        .iter()
        .filter(|l| l["type"] == "phase_changed")
        .map(|l| {
            (
                l["phase"].as_str().unwrap(),
                l["remaining_secs"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(changes, [("hold1", 56), ("exhale", 49), ("inhale", 41)]);

    let last = lines.last().unwrap();
    assert_eq!(last["type"], "state_snapshot");
    assert_eq!(last["phase_label"], "Inhale");
    assert_eq!(last["remaining_secs"], 41);
    assert_eq!(last["is_running"], true);
}

#[test]
fn test_simulate_runs_to_completion() {
    let home = home();
    let stdout = run_cli_success(
        home.path(),
        &[
            "session", "simulate", "--pattern", "energizing", "--minutes", "1", "--seconds",
            "120",
        ],
    );
    let lines = json_lines(&stdout);
    let n = lines.len();
    assert_eq!(lines[n - 2]["type"], "session_completed");
    assert_eq!(lines[n - 1]["remaining_secs"], 0);
    assert_eq!(lines[n - 1]["is_running"], false);
}

#[test]
fn test_simulate_audio_log() {
    let home = home();
    let stdout = run_cli_success(
        home.path(),
        &[
            "session", "simulate", "--pattern", "box-breathing", "--seconds", "4", "--audio-log",
            "--sound", "forest", "--volume", "40",
        ],
    );
    let commands: Vec<serde_json::Value> = json_lines(&stdout)
        .into_iter()
        .filter(|l| l.get("command").is_some())
        .collect();
    assert_eq!(commands[0]["command"], "play_background");
    assert_eq!(commands[0]["track"], "forest");
    assert_eq!(commands[1]["command"], "play_cue");
    assert_eq!(commands[1]["phase"], "inhale");
    assert_eq!(commands[2]["phase"], "hold1");
    assert_eq!(commands[2]["volume"], 40);
}

#[test]
fn test_simulate_no_audio_is_silent() {
    let home = home();
    let stdout = run_cli_success(
        home.path(),
        &[
            "session", "simulate", "--seconds", "10", "--audio-log", "--no-audio", "--sound",
            "none",
        ],
    );
    assert!(json_lines(&stdout)
        .iter()
        .all(|l| l.get("command").is_none()));
}

#[test]
fn test_simulate_rejects_zero_minutes() {
    let home = home();
    let stderr = run_cli_failure(
        home.path(),
        &["session", "simulate", "--minutes", "0", "--seconds", "5"],
    );
    assert!(stderr.contains("error:"));
}

#[test]
fn test_simulate_rejects_loud_volume() {
    let home = home();
    run_cli_failure(
        home.path(),
        &["session", "simulate", "--volume", "101", "--seconds", "1"],
    );
}

#[test]
fn test_run_rejects_out_of_range_speed() {
    let home = home();
    for speed in ["inf", "1e-300", "0"] {
        let stderr = run_cli_failure(
            home.path(),
            &["session", "run", "--minutes", "1", "--speed", speed],
        );
        assert!(stderr.contains("speed"), "speed {speed}: {stderr}");
    }
}

#[test]
fn test_config_defaults() {
    let home = home();
    let pattern = run_cli_success(home.path(), &["config", "get", "session.pattern"]);
    assert_eq!(pattern.trim(), "box-breathing");
    let volume = run_cli_success(home.path(), &["config", "get", "audio.volume"]);
    assert_eq!(volume.trim(), "80");
    assert!(home.path().join(".config/breathwork/config.toml").exists());
}

#[test]
fn test_config_set_drives_session_defaults() {
    let home = home();
    run_cli_success(home.path(), &["config", "set", "session.pattern", "4-7-8"]);
    run_cli_success(home.path(), &["config", "set", "session.duration_minutes", "1"]);

    let stdout = run_cli_success(home.path(), &["session", "simulate", "--seconds", "0"]);
    let lines = json_lines(&stdout);
    assert_eq!(lines[0]["pattern_id"], "4-7-8");
    assert_eq!(lines[0]["remaining_secs"], 60);
}

#[test]
fn test_config_rejects_bad_values() {
    let home = home();
    run_cli_failure(home.path(), &["config", "set", "audio.volume", "150"]);
    run_cli_failure(home.path(), &["config", "set", "session.pattern", "wim-hof"]);
    let stderr = run_cli_failure(home.path(), &["config", "get", "session.colour"]);
    assert!(stderr.contains("Unknown configuration key"));
}

#[test]
fn test_config_reset() {
    let home = home();
    run_cli_success(home.path(), &["config", "set", "audio.enabled", "false"]);
    run_cli_success(home.path(), &["config", "reset"]);
    let enabled = run_cli_success(home.path(), &["config", "get", "audio.enabled"]);
    assert_eq!(enabled.trim(), "true");
}

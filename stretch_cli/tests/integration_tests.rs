//! Integration tests for the stretch binary.
//!
//! These tests verify end-to-end behavior including:
//! - Routine listing and display
//! - Simulated playback (human and JSON output)
//! - Config-defined routines
//! - Real-time playback at high speed

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test config directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("stretch"))
}

/// Run `simulate --json` and parse every emitted line
fn simulate_json(args: &[&str]) -> Vec<Value> {
    let output = cli()
        .arg("simulate")
        .args(args)
        .arg("--json")
        .output()
        .expect("Failed to run simulate");
    assert!(output.status.success(), "simulate failed: {:?}", output);

    String::from_utf8(output.stdout)
        .expect("stdout is utf-8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("valid JSON line"))
        .collect()
}

fn events_named<'a>(events: &'a [Value], name: &str) -> Vec<&'a Value> {
    events.iter().filter(|e| e["event"] == name).collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Guided stretching routine player"));
}

#[test]
fn test_list_shows_builtin_routines() {
    cli()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("desk_break"))
        .stdout(predicate::str::contains("Hip Opener"))
        .stdout(predicate::str::contains("2m20s"));
}

#[test]
fn test_show_marks_bilateral_exercises() {
    cli()
        .arg("show")
        .arg("desk_break")
        .assert()
        .success()
        .stdout(predicate::str::contains("Seated Spinal Twist"))
        .stdout(predicate::str::contains("each side"));
}

#[test]
fn test_unknown_routine_fails() {
    cli()
        .arg("simulate")
        .arg("no_such_routine")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Routine not found: no_such_routine"));
}

#[test]
fn test_simulate_human_output() {
    cli()
        .arg("simulate")
        .arg("desk_break")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/4] Neck Rolls"))
        .stdout(predicate::str::contains("Switch sides"))
        .stdout(predicate::str::contains("Routine complete: 4 exercises"));
}

#[test]
fn test_simulate_json_event_stream() {
    let events = simulate_json(&["desk_break"]);

    assert_eq!(events.first().unwrap()["event"], "exercise_changed");
    let last = events.last().unwrap();
    assert_eq!(last["event"], "completed");
    assert_eq!(last["routine_id"], "desk_break");
    assert_eq!(last["total_exercises"], 4);
    assert_eq!(last["elapsed_minutes"], 2);

    // Four exercises plus the second side of the seated twist
    assert_eq!(events_named(&events, "exercise_changed").len(), 5);
    assert_eq!(events_named(&events, "side_switch_announced").len(), 1);

    let second_side = events_named(&events, "exercise_changed")
        .into_iter()
        .find(|e| e["side"] == "second")
        .expect("second side played");
    assert_eq!(second_side["exercise"]["id"], "seated_twist");
    assert_eq!(second_side["index"], 3);
}

#[test]
fn test_skip_at_bypasses_second_side() {
    let events = simulate_json(&["desk_break", "--skip-at", "3"]);

    assert!(events_named(&events, "side_switch_announced").is_empty());
    assert_eq!(events.last().unwrap()["event"], "completed");
}

#[test]
fn test_custom_routine_from_config() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[playback]
advance_delay_ms = 0

[[exercises]]
id = "wrist_flexor"
name = "Wrist Flexor Stretch"
duration_seconds = 20
needs_side_switch = true

[[routines]]
id = "typist"
name = "Typist Break"
exercises = ["wrist_flexor", "neck_rolls"]
"#,
    )
    .unwrap();

    cli()
        .arg("--config")
        .arg(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Typist Break"));

    cli()
        .arg("--config")
        .arg(&config_path)
        .arg("simulate")
        .arg("typist")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrist Flexor Stretch"))
        .stdout(predicate::str::contains("Routine complete: 2 exercises"));
}

#[test]
fn test_config_with_dangling_exercise_is_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[[routines]]
id = "broken"
name = "Broken"
exercises = ["not_an_exercise"]
"#,
    )
    .unwrap();

    cli()
        .arg("--config")
        .arg(&config_path)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not_an_exercise"));
}

#[test]
fn test_play_runs_to_completion_at_high_speed() {
    cli()
        .arg("play")
        .arg("desk_break")
        .arg("--speed")
        .arg("1000")
        .write_stdin("")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Routine complete: 4 exercises"));
}

#[test]
fn test_play_quit_command() {
    cli()
        .arg("play")
        .arg("hip_opener")
        .write_stdin("q\n")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped."))
        .stdout(predicate::str::contains("Routine complete").not());
}

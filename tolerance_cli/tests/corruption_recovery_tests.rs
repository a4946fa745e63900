//! Corruption recovery tests for tolr.
//!
//! These tests verify the system can handle:
//! - Garbage lines in the event log
//! - Partial writes
//! - Records that fail validation
//! - Broken config files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("tolr"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn log_session(data_dir: &Path) {
    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--subject")
        .arg("alice")
        .arg("--amount")
        .arg("100")
        .arg("--method")
        .arg("smoking")
        .arg("--rating")
        .arg("6")
        .assert()
        .success();
}

fn tolerance(data_dir: &Path) -> assert_cmd::assert::Assert {
    cli()
        .arg("tolerance")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--subject")
        .arg("alice")
        .assert()
}

#[test]
fn test_garbage_lines_are_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    log_session(&data_dir);

    let log_path = data_dir.join("events.jsonl");
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&log_path)
        .unwrap();
    writeln!(file, "{{ invalid json }}").unwrap();
    drop(file);

    log_session(&data_dir);
    log_session(&data_dir);

    // Three valid sessions survive around the bad line
    tolerance(&data_dir)
        .success()
        .stdout(predicate::str::contains("Data points: 3"))
        .stdout(predicate::str::contains("Current: 1.8x baseline"));
}

#[test]
fn test_partial_last_line() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    log_session(&data_dir);

    // Simulate a crash mid-write
    let log_path = data_dir.join("events.jsonl");
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&log_path)
        .unwrap();
    write!(file, r#"{{"id":"partial"#).unwrap();
    drop(file);

    tolerance(&data_dir)
        .success()
        .stdout(predicate::str::contains("Data points: 1"));
}

#[test]
fn test_invalid_record_rejected_on_replay() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    fs::create_dir_all(&data_dir).unwrap();

    // Well-formed JSON, but the rating is outside 1..=10
    let line = r#"{"id":"00000000-0000-0000-0000-000000000000","subject_id":"alice","logged_at":"2024-02-01T12:00:00Z","event":{"occurred_at":"2024-02-01T12:00:00Z","dose_amount":5.0,"method":"smoking","category":"hybrid","effect_rating":42,"duration_hours":2.0}}"#;
    fs::write(data_dir.join("events.jsonl"), format!("{}\n", line)).unwrap();

    tolerance(&data_dir)
        .success()
        .stdout(predicate::str::contains("Data points: 0"));
}

#[test]
fn test_empty_log() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("events.jsonl"), "").unwrap();

    log_session(&data_dir);

    tolerance(&data_dir)
        .success()
        .stdout(predicate::str::contains("Data points: 1"));
}

#[test]
fn test_missing_data_dir_is_created() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("nested").join("data");

    log_session(&data_dir);

    assert!(data_dir.join("events.jsonl").exists());
}

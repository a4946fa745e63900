//! Concurrency tests for tolr.
//!
//! These tests verify that multiple processes can safely:
//! - Append to the event log simultaneously (file locking)
//! - Read the log while other processes write to it

use assert_cmd::Command;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("tolr"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn log_command(data_dir: &Path, subject: &str) -> Command {
    let mut cmd = cli();
    cmd.arg("log")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--subject")
        .arg(subject)
        .arg("--amount")
        .arg("8")
        .arg("--method")
        .arg("vaping")
        .arg("--rating")
        .arg("6");
    cmd
}

#[test]
fn test_sequential_session_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        log_command(&data_dir, "alice").assert().success();
    }

    let log_path = data_dir.join("events.jsonl");
    let contents = std::fs::read_to_string(&log_path).expect("Failed to read event log");

    let session_count = contents.lines().count();
    assert_eq!(
        session_count, 5,
        "Expected 5 sessions, got {}",
        session_count
    );
}

#[test]
fn test_reads_between_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    log_command(&data_dir, "alice").assert().success();

    for i in 0..3 {
        thread::sleep(Duration::from_millis(i * 10));
        log_command(&data_dir, "alice").assert().success();

        // Readers can run at any time
        cli()
            .arg("tolerance")
            .arg("--data-dir")
            .arg(&data_dir)
            .arg("--subject")
            .arg("alice")
            .assert()
            .success();
    }

    let log_path = data_dir.join("events.jsonl");
    let contents = std::fs::read_to_string(&log_path).expect("Failed to read event log");
    assert_eq!(contents.lines().count(), 4);
}

#[test]
fn test_no_log_corruption_under_load() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                // Small stagger to reduce thundering herd
                thread::sleep(Duration::from_millis(i * 5));
                let subject = if i % 2 == 0 { "alice" } else { "bob" };
                log_command(&data_dir, subject)
                    .timeout(Duration::from_secs(10))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let log_path = data_dir.join("events.jsonl");
    let contents = std::fs::read_to_string(&log_path).expect("Failed to read event log");

    let mut valid_count = 0;
    for line in contents.lines() {
        if line.is_empty() {
            continue;
        }
        let parsed: Result<serde_json::Value, _> = serde_json::from_str(line);
        assert!(
            parsed.is_ok(),
            "Event log contains invalid JSON line: {}",
            line
        );
        valid_count += 1;
    }

    assert_eq!(valid_count, 10, "Expected 10 valid sessions in the log");
}

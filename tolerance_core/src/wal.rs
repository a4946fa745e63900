//! Append-only event log for the CLI host.
//!
//! Each accepted session is written as one JSON line, tagged with the subject
//! it belongs to. Appends take an exclusive file lock and reads take a shared
//! one, so concurrent `tolr` processes do not interleave partial lines.

use crate::{ConsumptionEvent, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One line of the event log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggedEvent {
    pub id: Uuid,
    pub subject_id: String,
    pub logged_at: DateTime<Utc>,
    pub event: ConsumptionEvent,
}

impl LoggedEvent {
    pub fn new(subject_id: impl Into<String>, event: ConsumptionEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            logged_at: Utc::now(),
            event,
        }
    }
}

/// Destination for accepted events
pub trait EventSink {
    fn append(&mut self, record: &LoggedEvent) -> Result<()>;
}

/// JSONL-based event sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl EventSink for JsonlSink {
    fn append(&mut self, record: &LoggedEvent) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended event {} for {} to log", record.id, record.subject_id);
        Ok(())
    }
}

/// Read every parseable record from the event log, in file order
///
/// Unparseable lines are logged and skipped.
pub fn read_events(path: &Path) -> Result<Vec<LoggedEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LoggedEvent>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping unreadable event at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} events from log", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, Method};

    fn record(subject: &str, dose: f64) -> LoggedEvent {
        LoggedEvent::new(
            subject,
            ConsumptionEvent::new(Utc::now(), dose, Method::Edibles, Category::Indica, 8, 4.0),
        )
    }

    #[test]
    fn test_append_and_read_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("events.jsonl");

        let original = record("alice", 12.5);
        let mut sink = JsonlSink::new(&log_path);
        sink.append(&original).unwrap();

        let records = read_events(&log_path).unwrap();
        assert_eq!(records, vec![original]);
    }

    #[test]
    fn test_order_is_preserved() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("nested").join("events.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        for dose in [1.0, 2.0, 3.0] {
            sink.append(&record("alice", dose)).unwrap();
        }

        let doses: Vec<f64> = read_events(&log_path)
            .unwrap()
            .iter()
            .map(|r| r.event.dose_amount)
            .collect();
        assert_eq!(doses, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = read_events(&temp_dir.path().join("nope.jsonl")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_garbage_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("events.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        sink.append(&record("alice", 1.0)).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
            writeln!(file, "{{\"id\": \"truncated").unwrap();
            writeln!(file).unwrap();
        }
        sink.append(&record("alice", 2.0)).unwrap();

        assert_eq!(read_events(&log_path).unwrap().len(), 2);
    }
}

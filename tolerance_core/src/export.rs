//! CSV export of logged sessions.
//!
//! The file is written to a temp file beside the target and renamed into
//! place, so a failed export never leaves a half-written CSV behind.

use crate::wal::LoggedEvent;
use crate::{Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    subject_id: String,
    occurred_at: String,
    dose_amount: f64,
    method: String,
    category: String,
    effect_rating: u8,
    duration_hours: f64,
}

impl From<&LoggedEvent> for CsvRow {
    fn from(record: &LoggedEvent) -> Self {
        let event = &record.event;
        CsvRow {
            id: record.id.to_string(),
            subject_id: record.subject_id.clone(),
            occurred_at: event.occurred_at.to_rfc3339(),
            dose_amount: event.dose_amount,
            method: event.method.to_string(),
            category: event.category.to_string(),
            effect_rating: event.effect_rating,
            duration_hours: event.duration_hours,
        }
    }
}

/// Write `records` to `path` as CSV with a header row
///
/// Returns the number of rows written. An existing file is replaced.
pub fn export_csv<'a>(
    records: impl IntoIterator<Item = &'a LoggedEvent>,
    path: &Path,
) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut count = 0;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp.as_file());
        for record in records {
            writer.serialize(CsvRow::from(record))?;
            count += 1;
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} sessions to {:?}", count, path);
    Ok(count)
}

//! Rebuilding engine state from the event log.
//!
//! The engine keeps nothing on disk, so every CLI invocation replays the log
//! in file order. Records the engine rejects (hand-edited or written by an
//! older build) are skipped with a warning rather than failing the replay.

use crate::config::EngineConfig;
use crate::wal::{read_events, LoggedEvent};
use crate::{Result, ToleranceEngine};
use std::path::Path;

/// Outcome of replaying records into an engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Feed records into `engine` in order
pub fn replay<'a>(
    engine: &mut ToleranceEngine,
    records: impl IntoIterator<Item = &'a LoggedEvent>,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();

    for record in records {
        match engine.record_event(&record.subject_id, record.event.clone()) {
            Ok(()) => summary.applied += 1,
            Err(e) => {
                tracing::warn!("Skipping logged event {}: {}", record.id, e);
                summary.rejected += 1;
            }
        }
    }

    summary
}

/// Build an engine from the event log at `path`
pub fn load_engine(path: &Path, config: &EngineConfig) -> Result<(ToleranceEngine, ReplaySummary)> {
    let records = read_events(path)?;
    let mut engine = ToleranceEngine::with_config(config.clone());
    let summary = replay(&mut engine, &records);

    tracing::info!(
        "Replayed {} events ({} rejected) across {} subjects",
        summary.applied,
        summary.rejected,
        engine.subjects().count()
    );

    Ok((engine, summary))
}

/// Records belonging to one subject, in log order
pub fn subject_records<'a>(records: &'a [LoggedEvent], subject_id: &str) -> Vec<&'a LoggedEvent> {
    records
        .iter()
        .filter(|r| r.subject_id == subject_id)
        .collect()
}

//! Per-subject consumption history and the tolerance model.
//!
//! Tolerance is derived from the last two weeks of history:
//! - Average daily dose picks a base tolerance tier
//! - Sessions per week scales that tier
//! - An empty window decays the previous value instead
//!
//! The growth rate tracks how often the subject logs sessions. Nothing
//! consumes it yet; it is kept for a time-decay model.

use crate::catalog::{DOSE_TIERS, FREQUENCY_MULTIPLIERS, GROWTH_STEPS};
use crate::ConsumptionEvent;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Maximum number of events kept per subject
pub const HISTORY_CAPACITY: usize = 100;

/// Events required before tolerance is recomputed
pub const MIN_EVENTS_FOR_RECOMPUTE: usize = 3;

/// Length of the tolerance window
pub const WINDOW_DAYS: i64 = 14;

pub const DEFAULT_TOLERANCE: f64 = 1.0;
pub const MIN_TOLERANCE: f64 = 0.5;
pub const MAX_TOLERANCE: f64 = 4.0;

/// Applied to the previous multiplier when the window holds no sessions
pub const DECAY_FACTOR: f64 = 0.85;

pub const DEFAULT_GROWTH_RATE: f64 = 0.05;

/// Number of most recent events used to estimate weekly frequency
pub const FREQUENCY_SAMPLE: usize = 30;

/// Events required before the growth rate adapts
pub const MIN_EVENTS_FOR_GROWTH: usize = 7;

/// Events needed before the dose trend is reported
pub const MIN_EVENTS_FOR_TREND: usize = 10;

/// History and derived tolerance state for one subject
#[derive(Clone, Debug)]
pub struct SubjectProfile {
    history: VecDeque<ConsumptionEvent>,
    tolerance_multiplier: f64,
    growth_rate: f64,
}

impl Default for SubjectProfile {
    fn default() -> Self {
        Self {
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            tolerance_multiplier: DEFAULT_TOLERANCE,
            growth_rate: DEFAULT_GROWTH_RATE,
        }
    }
}

impl SubjectProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logged events, oldest first
    pub fn history(&self) -> &VecDeque<ConsumptionEvent> {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Multiplier stored by the last recompute
    pub fn tolerance_multiplier(&self) -> f64 {
        self.tolerance_multiplier
    }

    pub fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Most recent `n` events, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ConsumptionEvent> {
        self.history.iter().skip(self.history.len().saturating_sub(n))
    }

    /// Latest session timestamp in the history
    pub fn latest_occurred_at(&self) -> Option<DateTime<Utc>> {
        self.history.iter().map(|e| e.occurred_at).max()
    }

    /// Append an event and recompute derived state
    ///
    /// Returns the evicted event when the history was already full.
    pub(crate) fn push(&mut self, event: ConsumptionEvent) -> Option<ConsumptionEvent> {
        self.history.push_back(event);
        let evicted = if self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front()
        } else {
            None
        };
        self.recompute();
        evicted
    }

    /// Recompute the multiplier and growth rate against the latest event
    fn recompute(&mut self) {
        if self.history.len() < MIN_EVENTS_FOR_RECOMPUTE {
            return;
        }
        let Some(reference) = self.latest_occurred_at() else {
            return;
        };

        let previous = self.tolerance_multiplier;
        self.tolerance_multiplier = window_tolerance(self.history.iter(), reference, previous);

        let sample: Vec<&ConsumptionEvent> = self.recent(FREQUENCY_SAMPLE).collect();
        if sample.len() >= MIN_EVENTS_FOR_GROWTH {
            self.growth_rate = adapt_growth_rate(self.growth_rate, &sample);
        }

        tracing::debug!(
            "Recomputed tolerance {:.2} -> {:.2}, growth rate {:.3}",
            previous,
            self.tolerance_multiplier,
            self.growth_rate
        );
    }

    /// Tolerance as seen from `now`, without touching stored state
    pub fn tolerance_at(&self, now: DateTime<Utc>) -> f64 {
        if self.history.is_empty() {
            return DEFAULT_TOLERANCE;
        }
        if self.history.len() < MIN_EVENTS_FOR_RECOMPUTE {
            return self.tolerance_multiplier;
        }
        window_tolerance(self.history.iter(), now, self.tolerance_multiplier)
    }

    /// Change in mean dose between the older and newer halves of the history,
    /// expressed per week
    pub fn dose_trend(&self) -> f64 {
        let len = self.history.len();
        if len < MIN_EVENTS_FOR_TREND {
            return 0.0;
        }

        let mid = len / 2;
        let early = mean_dose(self.history.range(..mid));
        let recent = mean_dose(self.history.range(mid..));

        (recent - early) / len as f64 * 7.0
    }
}

fn mean_dose<'a>(events: impl ExactSizeIterator<Item = &'a ConsumptionEvent>) -> f64 {
    let count = events.len();
    if count == 0 {
        return 0.0;
    }
    events.map(|e| e.dose_amount).sum::<f64>() / count as f64
}

/// Base tolerance for an average daily dose
pub fn base_tolerance(avg_daily_dose: f64) -> f64 {
    DOSE_TIERS.lookup(avg_daily_dose)
}

/// Multiplier for a weekly session count
pub fn frequency_multiplier(sessions_per_week: f64) -> f64 {
    FREQUENCY_MULTIPLIERS.lookup(sessions_per_week)
}

/// Tolerance from the events inside the window ending at `reference`
///
/// An empty window decays `previous` instead of computing a fresh value.
pub fn window_tolerance<'a>(
    events: impl IntoIterator<Item = &'a ConsumptionEvent>,
    reference: DateTime<Utc>,
    previous: f64,
) -> f64 {
    let cutoff = reference - Duration::days(WINDOW_DAYS);
    let (total_dose, sessions) = events
        .into_iter()
        .filter(|e| e.occurred_at > cutoff)
        .fold((0.0, 0usize), |(dose, count), e| (dose + e.dose_amount, count + 1));

    if sessions == 0 {
        return (previous * DECAY_FACTOR).clamp(MIN_TOLERANCE, MAX_TOLERANCE);
    }

    let avg_daily_dose = total_dose / WINDOW_DAYS as f64;
    let sessions_per_week = sessions as f64 / (WINDOW_DAYS as f64 / 7.0);

    (base_tolerance(avg_daily_dose) * frequency_multiplier(sessions_per_week))
        .clamp(MIN_TOLERANCE, MAX_TOLERANCE)
}

/// Adjust the growth rate for the weekly frequency of `sample`
///
/// The sample is taken in insertion order; its span is measured in whole days
/// and never counts as less than one week.
pub fn adapt_growth_rate(current: f64, sample: &[&ConsumptionEvent]) -> f64 {
    let (Some(first), Some(last)) = (sample.first(), sample.last()) else {
        return current;
    };

    let span_days = (last.occurred_at - first.occurred_at).num_days() as f64;
    let weeks = (span_days / 7.0).max(1.0);
    let per_week = sample.len() as f64 / weeks;

    GROWTH_STEPS.lookup(per_week).apply(current)
}

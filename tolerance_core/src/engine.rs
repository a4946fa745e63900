//! Tolerance engine: per-subject profiles and dose recommendations.
//!
//! The engine owns a store of [`SubjectProfile`]s keyed by subject id and
//! exposes four operations:
//! - `record_event` validates and ingests a session
//! - `current_tolerance` reads the multiplier against a reference clock
//! - `recommend` turns an intensity target into a dose, method and category
//! - `tolerance_trend` reports the per-week change in mean dose
//!
//! Everything is in memory. Hosts that share an engine across threads must
//! serialise `record_event` calls per subject; ordering matters because the
//! model works on "most recent N" and time windows.

use crate::catalog::get_default_catalog;
use crate::config::EngineConfig;
use crate::insights::{self, BreakPlan, EffectivenessAnalysis, MethodEfficiency};
use crate::profile::{SubjectProfile, DEFAULT_TOLERANCE};
use crate::{
    Category, ConsumptionEvent, IntensityTier, Method, Recommendation, SubjectId, TimingHint,
    ToleranceBand, ValidationError,
};
use chrono::{DateTime, Timelike, Utc};
use std::collections::HashMap;

/// Latest sessions averaged for the timing hint
const TIMING_SAMPLE: usize = 20;

const BASE_CONFIDENCE: f64 = 0.5;
const CONFIDENCE_PER_EVENT: f64 = 0.01;
const MAX_CONFIDENCE: f64 = 0.95;

/// Tolerance above which the explanation suggests a break
const BREAK_SUGGESTION_TOLERANCE: f64 = 2.0;

/// In-memory rules engine over per-subject consumption histories
#[derive(Clone, Debug, Default)]
pub struct ToleranceEngine {
    profiles: HashMap<SubjectId, SubjectProfile>,
    config: EngineConfig,
}

impl ToleranceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            profiles: HashMap::new(),
            config,
        }
    }

    /// Profile for a subject, if one has been created
    pub fn profile(&self, subject_id: &str) -> Option<&SubjectProfile> {
        self.profiles.get(subject_id)
    }

    /// Ids of every subject with a profile
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Validate and ingest a session for `subject_id`
    ///
    /// The profile is created on first use. Events are not de-duplicated:
    /// logging the same session twice counts it twice.
    pub fn record_event(
        &mut self,
        subject_id: &str,
        event: ConsumptionEvent,
    ) -> Result<(), ValidationError> {
        validate_subject(subject_id)?;
        event.validate()?;

        let profile = self.profiles.entry(subject_id.to_string()).or_default();
        if let Some(evicted) = profile.push(event) {
            tracing::debug!(
                "Evicted session from {} for subject {}",
                evicted.occurred_at,
                subject_id
            );
        }

        tracing::debug!(
            "Recorded session for {}: {} events, tolerance {:.2}",
            subject_id,
            profile.len(),
            profile.tolerance_multiplier()
        );
        Ok(())
    }

    /// Tolerance multiplier for a subject as seen from `now`
    ///
    /// Subjects with no history read as the default of 1.0. This never
    /// modifies stored state, so repeated reads after a long gap decay only
    /// once relative to the stored multiplier.
    pub fn current_tolerance(&self, subject_id: &str, now: DateTime<Utc>) -> f64 {
        self.profiles
            .get(subject_id)
            .map(|p| p.tolerance_at(now))
            .unwrap_or(DEFAULT_TOLERANCE)
    }

    /// Create a profile for an unseen subject, opened with a placeholder session
    pub fn ensure_profile(
        &mut self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<&SubjectProfile, ValidationError> {
        validate_subject(subject_id)?;
        if !self.profiles.contains_key(subject_id) {
            tracing::info!("Seeding new profile for subject {}", subject_id);
            self.record_event(subject_id, ConsumptionEvent::seed(now))?;
        }
        self.profiles
            .get(subject_id)
            .ok_or(ValidationError::EmptySubject)
    }

    /// Recommend a dose for the requested intensity
    ///
    /// When seeding is enabled (the default) an unseen subject gets a profile
    /// with one placeholder session before the recommendation is computed, so
    /// this call can create state.
    pub fn recommend(
        &mut self,
        subject_id: &str,
        target: IntensityTier,
        method: Option<Method>,
        category: Option<Category>,
        now: DateTime<Utc>,
    ) -> Result<Recommendation, ValidationError> {
        validate_subject(subject_id)?;
        if self.config.seed_new_subjects {
            self.ensure_profile(subject_id, now)?;
        }

        let catalog = get_default_catalog();
        let tier = catalog.intensity(target);
        let tolerance = self.current_tolerance(subject_id, now);

        let method = method.unwrap_or(tier.default_method);
        let category = category.unwrap_or_else(|| tier.default_category.clone());
        let adjusted_dose = tier.base_dose * tolerance;
        let dose = round_to_tenth(adjusted_dose / catalog.bioavailability(method));

        let profile = self.profiles.get(subject_id);
        let history_len = profile.map(|p| p.len()).unwrap_or(0);
        let confidence = (BASE_CONFIDENCE + CONFIDENCE_PER_EVENT * history_len as f64)
            .min(MAX_CONFIDENCE);
        let timing_hint = timing_hint(profile, catalog.delayed_onset(method));
        let explanation = explain(tolerance, method, &category, target);

        tracing::info!(
            "Recommended {} via {} for {} ({} tolerance {:.2})",
            dose,
            method,
            subject_id,
            target,
            tolerance
        );

        Ok(Recommendation {
            target,
            dose,
            method,
            category,
            timing_hint,
            confidence,
            tolerance,
            explanation,
        })
    }

    /// Per-week change in mean dose; 0.0 until there are 10 events
    pub fn tolerance_trend(&self, subject_id: &str) -> f64 {
        self.profiles
            .get(subject_id)
            .map(|p| p.dose_trend())
            .unwrap_or(0.0)
    }

    /// Effect-versus-dosage analysis over the last two weeks
    pub fn effectiveness(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Option<EffectivenessAnalysis> {
        let profile = self.profiles.get(subject_id)?;
        insights::analyze_effectiveness(profile.history(), now)
    }

    /// Tolerance break sized from the last 30 days
    pub fn break_plan(&self, subject_id: &str, now: DateTime<Utc>) -> BreakPlan {
        let history = self.profiles.get(subject_id).map(|p| p.history());
        insights::suggest_tolerance_break(history.into_iter().flatten(), now)
    }

    /// Efficiency score per method
    pub fn method_efficiency(&self, subject_id: &str) -> Vec<MethodEfficiency> {
        self.profiles
            .get(subject_id)
            .map(|p| insights::method_efficiency(p.history()))
            .unwrap_or_default()
    }
}

fn validate_subject(subject_id: &str) -> Result<(), ValidationError> {
    if subject_id.trim().is_empty() {
        return Err(ValidationError::EmptySubject);
    }
    Ok(())
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Timing hint from the hour of day of the latest sessions
fn timing_hint(profile: Option<&SubjectProfile>, delayed_onset: bool) -> TimingHint {
    let hours: Vec<u32> = profile
        .map(|p| p.recent(TIMING_SAMPLE).map(|e| e.occurred_at.hour()).collect())
        .unwrap_or_default();

    if hours.is_empty() {
        return TimingHint::Generic { delayed_onset };
    }

    let mean_hour = hours.iter().sum::<u32>() / hours.len() as u32;
    let hour = if delayed_onset {
        (mean_hour + 24 - 2) % 24
    } else {
        mean_hour
    };

    TimingHint::Personalized {
        hour,
        delayed_onset,
    }
}

fn explain(tolerance: f64, method: Method, category: &Category, target: IntensityTier) -> String {
    let band = ToleranceBand::from_multiplier(tolerance);
    let mut parts = vec![
        format!(
            "Based on your {} tolerance level ({:.1}x)",
            band.as_str(),
            tolerance
        ),
        format!(
            "{} gives suitable bioavailability for {} effects",
            method.label(),
            target.label()
        ),
        format!(
            "{} strains match the desired experience",
            category.label()
        ),
    ];

    if tolerance > BREAK_SUGGESTION_TOLERANCE {
        parts.push("Consider a tolerance break to reset sensitivity".to_string());
    }

    parts.join(" • ")
}

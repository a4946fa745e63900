//! Derived analyses over a subject's history.
//!
//! These feed the tolerance report: how effectiveness has moved against
//! dosage, how long a tolerance break should be, and which methods give the
//! most effect per unit of dose.

use crate::catalog::BREAK_PLANS;
use crate::{ConsumptionEvent, Method};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Days of history aggregated for the effectiveness trend
pub const EFFECTIVENESS_WINDOW_DAYS: i64 = 14;

/// Distinct days with data needed before the trend is analysed
pub const MIN_DAYS_FOR_EFFECTIVENESS: usize = 7;

/// Days of history used to size a tolerance break
pub const BREAK_WINDOW_DAYS: i64 = 30;

/// Sessions with one method needed before it is scored
pub const MIN_SESSIONS_FOR_EFFICIENCY: usize = 2;

// Rating shifts on the 1-10 scale
const SHARP_DROP: f64 = -2.0;
const DROP: f64 = -1.0;
const SLIGHT_DROP: f64 = -0.6;
const RISE: f64 = 0.6;

// ============================================================================
// Effectiveness trend
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrendStatus {
    /// Effects are fading while dosage climbs
    Increasing,
    SlightIncrease,
    Improving,
    Stable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    High,
    Moderate,
    Low,
    Good,
    Normal,
}

/// Comparison of the earlier and later halves of recent daily data
#[derive(Clone, Debug, PartialEq)]
pub struct EffectivenessAnalysis {
    pub status: TrendStatus,
    pub severity: Severity,
    pub effectiveness_change: f64,
    pub dosage_change_pct: f64,
    pub early_effectiveness: f64,
    pub recent_effectiveness: f64,
    pub early_dosage: f64,
    pub recent_dosage: f64,
    pub days_with_data: usize,
}

#[derive(Default)]
struct DailyTotals {
    rating_sum: f64,
    sessions: usize,
    dose: f64,
}

/// Analyse how effect ratings have moved against dosage over the last two weeks
///
/// Returns `None` until at least a week's worth of days carry data.
pub fn analyze_effectiveness<'a>(
    events: impl IntoIterator<Item = &'a ConsumptionEvent>,
    now: DateTime<Utc>,
) -> Option<EffectivenessAnalysis> {
    let cutoff = now - Duration::days(EFFECTIVENESS_WINDOW_DAYS);
    let mut days: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();

    for event in events.into_iter().filter(|e| e.occurred_at > cutoff) {
        let day = days.entry(event.occurred_at.date_naive()).or_default();
        day.rating_sum += event.effect_rating as f64;
        day.sessions += 1;
        day.dose += event.dose_amount;
    }

    if days.len() < MIN_DAYS_FOR_EFFECTIVENESS {
        tracing::debug!(
            "Only {} days with data, need {} for effectiveness analysis",
            days.len(),
            MIN_DAYS_FOR_EFFECTIVENESS
        );
        return None;
    }

    let effectiveness: Vec<f64> = days
        .values()
        .map(|d| d.rating_sum / d.sessions as f64)
        .collect();
    let dosage: Vec<f64> = days.values().map(|d| d.dose).filter(|d| *d > 0.0).collect();
    if dosage.is_empty() {
        return None;
    }

    let mid = effectiveness.len() / 2;
    let early_effectiveness = mean(&effectiveness[..mid]);
    let recent_effectiveness = mean(&effectiveness[mid..]);
    let (early_dosage, recent_dosage) = if dosage.len() > mid {
        (mean(&dosage[..mid]), mean(&dosage[mid..]))
    } else {
        (mean(&dosage), mean(&dosage))
    };

    let effectiveness_change = recent_effectiveness - early_effectiveness;
    let dosage_change = recent_dosage - early_dosage;
    let dosage_change_pct = if early_dosage > 0.0 {
        dosage_change / early_dosage * 100.0
    } else {
        0.0
    };

    let (status, severity) = if effectiveness_change < DROP && dosage_change > 0.0 {
        let severity = if effectiveness_change < SHARP_DROP {
            Severity::High
        } else {
            Severity::Moderate
        };
        (TrendStatus::Increasing, severity)
    } else if effectiveness_change < SLIGHT_DROP {
        (TrendStatus::SlightIncrease, Severity::Low)
    } else if effectiveness_change > RISE {
        (TrendStatus::Improving, Severity::Good)
    } else {
        (TrendStatus::Stable, Severity::Normal)
    };

    Some(EffectivenessAnalysis {
        status,
        severity,
        effectiveness_change,
        dosage_change_pct,
        early_effectiveness,
        recent_effectiveness,
        early_dosage,
        recent_dosage,
        days_with_data: days.len(),
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// ============================================================================
// Tolerance break
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakIntensity {
    Minimal,
    Mild,
    Moderate,
    Full,
}

impl BreakIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakIntensity::Minimal => "minimal",
            BreakIntensity::Mild => "mild",
            BreakIntensity::Moderate => "moderate",
            BreakIntensity::Full => "full",
        }
    }
}

/// Suggested tolerance break sized from the last 30 days of use
#[derive(Clone, Debug, PartialEq)]
pub struct BreakPlan {
    pub suggested_days: u32,
    pub intensity: BreakIntensity,
    pub avg_daily_dose: f64,
    pub sessions_per_day: f64,
}

pub fn suggest_tolerance_break<'a>(
    events: impl IntoIterator<Item = &'a ConsumptionEvent>,
    now: DateTime<Utc>,
) -> BreakPlan {
    let cutoff = now - Duration::days(BREAK_WINDOW_DAYS);
    let (total_dose, sessions) = events
        .into_iter()
        .filter(|e| e.occurred_at > cutoff)
        .fold((0.0, 0usize), |(dose, count), e| (dose + e.dose_amount, count + 1));

    let avg_daily_dose = total_dose / BREAK_WINDOW_DAYS as f64;
    let (suggested_days, intensity) = BREAK_PLANS.lookup(avg_daily_dose);

    BreakPlan {
        suggested_days,
        intensity,
        avg_daily_dose,
        sessions_per_day: sessions as f64 / BREAK_WINDOW_DAYS as f64,
    }
}

// ============================================================================
// Method efficiency
// ============================================================================

/// Effect delivered per unit of dose for one method
#[derive(Clone, Debug, PartialEq)]
pub struct MethodEfficiency {
    pub method: Method,
    pub sessions: usize,
    pub avg_dose: f64,
    pub avg_rating: f64,
    /// Mean rating divided by mean dose; zero when the mean dose is zero
    pub score: f64,
}

/// Score each method that has been used at least twice, in method order
pub fn method_efficiency<'a>(
    events: impl IntoIterator<Item = &'a ConsumptionEvent>,
) -> Vec<MethodEfficiency> {
    let mut by_method: BTreeMap<Method, (usize, f64, f64)> = BTreeMap::new();
    for event in events {
        let entry = by_method.entry(event.method).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += event.dose_amount;
        entry.2 += event.effect_rating as f64;
    }

    by_method
        .into_iter()
        .filter(|(_, (sessions, _, _))| *sessions >= MIN_SESSIONS_FOR_EFFICIENCY)
        .map(|(method, (sessions, dose_sum, rating_sum))| {
            let avg_dose = dose_sum / sessions as f64;
            let avg_rating = rating_sum / sessions as f64;
            let score = if avg_dose > 0.0 {
                avg_rating / avg_dose
            } else {
                0.0
            };
            MethodEfficiency {
                method,
                sessions,
                avg_dose,
                avg_rating,
                score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 21, 0, 0).unwrap()
    }

    fn session(days_ago: i64, dose: f64, method: Method, rating: u8) -> ConsumptionEvent {
        ConsumptionEvent::new(
            now() - Duration::days(days_ago),
            dose,
            method,
            Category::Hybrid,
            rating,
            2.0,
        )
    }

    #[test]
    fn test_effectiveness_needs_a_week_of_days() {
        let events: Vec<_> = (0..6).map(|d| session(d, 10.0, Method::Vaping, 7)).collect();
        assert!(analyze_effectiveness(&events, now()).is_none());
    }

    #[test]
    fn test_fading_effects_with_rising_dose() {
        // Oldest days first: strong effects on small doses, then weak effects on large ones
        let events: Vec<_> = (0..10)
            .map(|d| {
                if d >= 5 {
                    session(d, 10.0, Method::Vaping, 9)
                } else {
                    session(d, 30.0, Method::Vaping, 5)
                }
            })
            .collect();

        let analysis = analyze_effectiveness(&events, now()).unwrap();
        assert_eq!(analysis.days_with_data, 10);
        assert_eq!(analysis.status, TrendStatus::Increasing);
        assert_eq!(analysis.severity, Severity::High);
        assert!((analysis.dosage_change_pct - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_stable_effects() {
        let events: Vec<_> = (0..8).map(|d| session(d, 10.0, Method::Vaping, 6)).collect();
        let analysis = analyze_effectiveness(&events, now()).unwrap();
        assert_eq!(analysis.status, TrendStatus::Stable);
        assert_eq!(analysis.severity, Severity::Normal);
    }

    #[test]
    fn test_moderate_drop_is_slight_increase() {
        // Ratings slip by 0.75 while dosage doubles
        let recent_ratings = [6, 6, 7, 6];
        let events: Vec<_> = (0..8)
            .map(|d| {
                if d >= 4 {
                    session(d, 10.0, Method::Vaping, 7)
                } else {
                    session(d, 20.0, Method::Vaping, recent_ratings[d as usize])
                }
            })
            .collect();

        let analysis = analyze_effectiveness(&events, now()).unwrap();
        assert!((analysis.effectiveness_change + 0.75).abs() < 1e-9);
        assert_eq!(analysis.status, TrendStatus::SlightIncrease);
        assert_eq!(analysis.severity, Severity::Low);
    }

    #[test]
    fn test_improving_effects() {
        let events: Vec<_> = (0..8)
            .map(|d| session(d, 10.0, Method::Vaping, if d < 4 { 8 } else { 5 }))
            .collect();
        let analysis = analyze_effectiveness(&events, now()).unwrap();
        assert_eq!(analysis.status, TrendStatus::Improving);
    }

    #[test]
    fn test_break_plan_tiers() {
        let light: Vec<_> = (0..10).map(|d| session(d, 3.0, Method::Vaping, 6)).collect();
        let plan = suggest_tolerance_break(&light, now());
        assert_eq!(plan.suggested_days, 2);
        assert_eq!(plan.intensity, BreakIntensity::Minimal);
        assert!((plan.avg_daily_dose - 1.0).abs() < 1e-9);
        assert!((plan.sessions_per_day - 10.0 / 30.0).abs() < 1e-9);

        let heavy: Vec<_> = (0..29).map(|d| session(d, 120.0, Method::Dabbing, 6)).collect();
        let plan = suggest_tolerance_break(&heavy, now());
        assert_eq!(plan.suggested_days, 7);
        assert_eq!(plan.intensity, BreakIntensity::Full);
    }

    #[test]
    fn test_break_plan_ignores_old_sessions() {
        let old: Vec<_> = (31..60).map(|d| session(d, 500.0, Method::Smoking, 6)).collect();
        let plan = suggest_tolerance_break(&old, now());
        assert_eq!(plan.intensity, BreakIntensity::Minimal);
        assert_eq!(plan.sessions_per_day, 0.0);
    }

    #[test]
    fn test_method_efficiency() {
        let events = vec![
            session(3, 10.0, Method::Vaping, 6),
            session(2, 10.0, Method::Vaping, 8),
            session(1, 20.0, Method::Edibles, 8),
            session(0, 0.0, Method::Smoking, 5),
            session(0, 0.0, Method::Smoking, 5),
        ];

        let scores = method_efficiency(&events);
        assert_eq!(scores.len(), 2);

        assert_eq!(scores[0].method, Method::Smoking);
        assert_eq!(scores[0].score, 0.0);

        assert_eq!(scores[1].method, Method::Vaping);
        assert_eq!(scores[1].sessions, 2);
        assert!((scores[1].score - 0.7).abs() < 1e-9);
    }
}

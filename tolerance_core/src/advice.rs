//! Deterministic guidance text for rendered reports.

use crate::catalog::{get_default_catalog, TOLERANCE_LEVELS};
use crate::insights::{EffectivenessAnalysis, Severity, TrendStatus};
use crate::{ConsumptionEvent, Method};
use std::collections::HashSet;

/// Dose above which the "start with half" note is shown
const HIGH_DOSE: f64 = 20.0;

/// Recent sessions checked for method rotation
const ROTATION_WINDOW: usize = 5;

/// Descriptive tolerance level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToleranceLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ToleranceLevel {
    pub fn from_multiplier(multiplier: f64) -> Self {
        TOLERANCE_LEVELS.lookup(multiplier)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToleranceLevel::Low => "Low (new or occasional use)",
            ToleranceLevel::Moderate => "Moderate (regular use)",
            ToleranceLevel::High => "High (frequent use)",
            ToleranceLevel::VeryHigh => "Very high (daily or more)",
        }
    }
}

/// Safety notes for a recommended dose
pub fn safety_guidelines(dose: f64, method: Method) -> Vec<&'static str> {
    let mut tips = Vec::new();

    if dose > HIGH_DOSE {
        tips.push("High dose: start with half and wait");
    }

    if let Some(note) = get_default_catalog()
        .methods
        .get(&method)
        .and_then(|m| m.safety_note)
    {
        tips.push(note);
    }

    tips.push("Stay hydrated and keep snacks nearby");
    tips.push("Consume in a safe, comfortable environment");
    tips
}

/// Suggestions for keeping tolerance in check
///
/// `recent` is the subject's history, oldest first.
pub fn tolerance_suggestions(tolerance: f64, recent: &[&ConsumptionEvent]) -> Vec<&'static str> {
    let mut suggestions = Vec::new();

    if tolerance > 2.5 {
        suggestions.push("Consider a tolerance break (3-7 days)");
    } else if tolerance > 2.0 {
        suggestions.push("Try reducing your dose by 20-30%");
    }

    if recent.len() >= ROTATION_WINDOW {
        let methods: HashSet<Method> = recent[recent.len() - ROTATION_WINDOW..]
            .iter()
            .map(|e| e.method)
            .collect();
        if methods.len() == 1 {
            suggestions.push("Try rotating consumption methods");
        }
    }

    suggestions.push("Microdosing can help reset sensitivity");
    suggestions
}

/// Recommendations that follow from an effectiveness analysis
pub fn effectiveness_advice(analysis: &EffectivenessAnalysis) -> Vec<&'static str> {
    match (analysis.status, analysis.severity) {
        (TrendStatus::Increasing, Severity::High) => vec![
            "Consider a tolerance break of 3-7 days",
            "Reduce dosage by 25-50% when resuming",
            "Try a different consumption method",
            "Space sessions at least 2-3 hours apart",
        ],
        (TrendStatus::Increasing, _) => vec![
            "Monitor tolerance closely and consider microdosing",
            "Alternate strains to avoid method-specific tolerance",
            "Increase the time between sessions",
        ],
        (TrendStatus::SlightIncrease, _) => vec![
            "Consider reducing dosage slightly (10-20%)",
            "Try CBD-dominant strains to modulate tolerance",
            "Take occasional rest days between sessions",
        ],
        (TrendStatus::Improving, _) => vec![
            "Current approach is working well",
            "Keep your current dosage and methods",
        ],
        (TrendStatus::Stable, _) => vec![
            "Tolerance appears stable",
            "Consider rotating strains for variety",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use chrono::Utc;

    fn events(methods: &[Method]) -> Vec<ConsumptionEvent> {
        methods
            .iter()
            .map(|m| ConsumptionEvent::new(Utc::now(), 5.0, *m, Category::Sativa, 6, 1.0))
            .collect()
    }

    #[test]
    fn test_tolerance_levels() {
        assert_eq!(ToleranceLevel::from_multiplier(1.0), ToleranceLevel::Low);
        assert_eq!(ToleranceLevel::from_multiplier(1.2), ToleranceLevel::Moderate);
        assert_eq!(ToleranceLevel::from_multiplier(2.0), ToleranceLevel::High);
        assert_eq!(ToleranceLevel::from_multiplier(3.0), ToleranceLevel::VeryHigh);
    }

    #[test]
    fn test_safety_for_strong_edibles() {
        let tips = safety_guidelines(133.3, Method::Edibles);
        assert_eq!(tips.len(), 4);
        assert!(tips[0].starts_with("High dose"));
        assert!(tips[1].contains("edibles"));
    }

    #[test]
    fn test_safety_for_light_vaping() {
        let tips = safety_guidelines(11.1, Method::Vaping);
        assert_eq!(tips.len(), 2);
    }

    #[test]
    fn test_rotation_suggested_for_single_method() {
        let history = events(&[Method::Vaping; 5]);
        let refs: Vec<&ConsumptionEvent> = history.iter().collect();
        let suggestions = tolerance_suggestions(1.0, &refs);
        assert!(suggestions.contains(&"Try rotating consumption methods"));
    }

    #[test]
    fn test_break_suggested_for_high_tolerance() {
        let history = events(&[Method::Vaping, Method::Edibles]);
        let refs: Vec<&ConsumptionEvent> = history.iter().collect();

        let suggestions = tolerance_suggestions(3.0, &refs);
        assert_eq!(suggestions[0], "Consider a tolerance break (3-7 days)");
        assert_eq!(suggestions.len(), 2);

        let suggestions = tolerance_suggestions(2.2, &refs);
        assert!(suggestions[0].contains("reducing"));
    }
}

//! Fixed lookup tables for dosing and tolerance.
//!
//! This module holds every constant the engine consults: bioavailability per
//! method, base doses and defaults per intensity tier, and the breakpoint
//! ladders used by the tolerance model and the advice helpers.

use crate::advice::ToleranceLevel;
use crate::insights::BreakIntensity;
use crate::ladder::{Ladder, Rung};
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Bioavailability applied when a method has no table entry
pub const DEFAULT_BIOAVAILABILITY: f64 = 0.30;

/// Cached default catalog, built once per process
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

// ============================================================================
// Ladders
// ============================================================================

/// Average daily dose over the window → base tolerance
///
/// The top tier starts at exactly 50; the lower tiers need to be exceeded.
pub const DOSE_TIERS: Ladder<f64> = Ladder::new(
    &[
        Rung::above(5.0, 1.3),
        Rung::above(20.0, 1.8),
        Rung::at_least(50.0, 2.5),
    ],
    1.0,
);

/// Sessions per week over the window → tolerance multiplier
pub const FREQUENCY_MULTIPLIERS: Ladder<f64> =
    Ladder::new(&[Rung::above(5.0, 1.2), Rung::above(10.0, 1.4)], 1.0);

/// Adjustment to the growth rate for a weekly session frequency
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GrowthStep {
    Raise { factor: f64, cap: f64 },
    Lower { factor: f64, floor: f64 },
}

impl GrowthStep {
    pub fn apply(self, rate: f64) -> f64 {
        match self {
            GrowthStep::Raise { factor, cap } => (rate * factor).min(cap),
            GrowthStep::Lower { factor, floor } => (rate * factor).max(floor),
        }
    }
}

/// Sessions per week → growth rate adjustment
pub const GROWTH_STEPS: Ladder<GrowthStep> = Ladder::new(
    &[
        Rung::above(3.0, GrowthStep::Raise { factor: 1.1, cap: 0.10 }),
        Rung::above(7.0, GrowthStep::Raise { factor: 1.2, cap: 0.15 }),
    ],
    GrowthStep::Lower {
        factor: 0.9,
        floor: 0.02,
    },
);

/// Tolerance multiplier → explanation band
pub const TOLERANCE_BANDS: Ladder<ToleranceBand> = Ladder::new(
    &[
        Rung::at_least(1.5, ToleranceBand::Moderate),
        Rung::at_least(2.5, ToleranceBand::High),
    ],
    ToleranceBand::Low,
);

/// Tolerance multiplier → descriptive level
pub const TOLERANCE_LEVELS: Ladder<ToleranceLevel> = Ladder::new(
    &[
        Rung::at_least(1.2, ToleranceLevel::Moderate),
        Rung::at_least(1.8, ToleranceLevel::High),
        Rung::at_least(2.5, ToleranceLevel::VeryHigh),
    ],
    ToleranceLevel::Low,
);

/// Average daily dose over 30 days → suggested break (days, intensity)
pub const BREAK_PLANS: Ladder<(u32, BreakIntensity)> = Ladder::new(
    &[
        Rung::above(25.0, (3, BreakIntensity::Mild)),
        Rung::above(50.0, (5, BreakIntensity::Moderate)),
        Rung::above(100.0, (7, BreakIntensity::Full)),
    ],
    (2, BreakIntensity::Minimal),
);

// ============================================================================
// Catalog
// ============================================================================

/// Per-method absorption and handling notes
#[derive(Clone, Debug)]
pub struct MethodProfile {
    pub method: Method,
    /// Fraction of the administered amount that is absorbed
    pub bioavailability: f64,
    /// Effects take hours to arrive, so sessions should start earlier
    pub delayed_onset: bool,
    pub safety_note: Option<&'static str>,
}

/// Base dose and default choices for an intensity tier
#[derive(Clone, Debug)]
pub struct IntensityProfile {
    pub tier: IntensityTier,
    pub base_dose: f64,
    pub default_method: Method,
    pub default_category: Category,
}

/// The complete set of method and intensity tables
#[derive(Clone, Debug)]
pub struct Catalog {
    pub methods: HashMap<Method, MethodProfile>,
    pub intensities: HashMap<IntensityTier, IntensityProfile>,
}

impl Catalog {
    /// Bioavailability for a method, or the default when it is missing
    pub fn bioavailability(&self, method: Method) -> f64 {
        self.methods
            .get(&method)
            .map(|m| m.bioavailability)
            .unwrap_or(DEFAULT_BIOAVAILABILITY)
    }

    pub fn delayed_onset(&self, method: Method) -> bool {
        self.methods
            .get(&method)
            .map(|m| m.delayed_onset)
            .unwrap_or(false)
    }

    /// Tier profile; a missing tier falls back to moderate
    pub fn intensity(&self, tier: IntensityTier) -> &IntensityProfile {
        self.intensities
            .get(&tier)
            .or_else(|| self.intensities.get(&IntensityTier::Moderate))
            .unwrap_or(&FALLBACK_INTENSITY)
    }

    /// Check the catalog for consistency, returning a list of problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for method in Method::ALL {
            match self.methods.get(&method) {
                None => errors.push(format!("Method '{}' has no profile", method)),
                Some(profile) => {
                    if profile.method != method {
                        errors.push(format!(
                            "Method profile key '{}' does not match profile method '{}'",
                            method, profile.method
                        ));
                    }
                    if !(profile.bioavailability > 0.0 && profile.bioavailability <= 1.0) {
                        errors.push(format!(
                            "Method '{}': bioavailability {} outside (0, 1]",
                            method, profile.bioavailability
                        ));
                    }
                }
            }
        }

        let mut previous_dose = 0.0;
        for tier in IntensityTier::ALL {
            match self.intensities.get(&tier) {
                None => errors.push(format!("Intensity '{}' has no profile", tier)),
                Some(profile) => {
                    if profile.base_dose <= previous_dose {
                        errors.push(format!(
                            "Intensity '{}': base dose {} does not exceed the weaker tier",
                            tier, profile.base_dose
                        ));
                    }
                    previous_dose = profile.base_dose;
                }
            }
        }

        for (name, sorted) in [
            ("dose tiers", DOSE_TIERS.is_sorted()),
            ("frequency multipliers", FREQUENCY_MULTIPLIERS.is_sorted()),
            ("growth steps", GROWTH_STEPS.is_sorted()),
            ("tolerance bands", TOLERANCE_BANDS.is_sorted()),
            ("tolerance levels", TOLERANCE_LEVELS.is_sorted()),
            ("break plans", BREAK_PLANS.is_sorted()),
        ] {
            if !sorted {
                errors.push(format!("Ladder '{}' is not in ascending order", name));
            }
        }

        errors
    }
}

static FALLBACK_INTENSITY: Lazy<IntensityProfile> = Lazy::new(|| IntensityProfile {
    tier: IntensityTier::Moderate,
    base_dose: 10.0,
    default_method: Method::Smoking,
    default_category: Category::Hybrid,
});

/// Builds the default catalog
pub fn build_default_catalog() -> Catalog {
    let methods = [
        (Method::Smoking, 0.30, false, None),
        (Method::Vaping, 0.45, false, None),
        (
            Method::Edibles,
            0.15,
            true,
            Some("Wait 2+ hours before redosing with edibles"),
        ),
        (Method::Tinctures, 0.25, true, None),
        (
            Method::Dabbing,
            0.75,
            false,
            Some("Start small with concentrates, they are very potent"),
        ),
        (Method::Topicals, 0.05, false, None),
    ]
    .into_iter()
    .map(|(method, bioavailability, delayed_onset, safety_note)| {
        (
            method,
            MethodProfile {
                method,
                bioavailability,
                delayed_onset,
                safety_note,
            },
        )
    })
    .collect();

    let intensities = [
        (IntensityTier::Microdose, 2.5, Method::Vaping, Category::Hybrid),
        (IntensityTier::Light, 5.0, Method::Vaping, Category::Sativa),
        (IntensityTier::Moderate, 10.0, Method::Smoking, Category::Hybrid),
        (IntensityTier::Strong, 20.0, Method::Edibles, Category::Indica),
        (IntensityTier::VeryStrong, 35.0, Method::Dabbing, Category::Indica),
    ]
    .into_iter()
    .map(|(tier, base_dose, default_method, default_category)| {
        (
            tier,
            IntensityProfile {
                tier,
                base_dose,
                default_method,
                default_category,
            },
        )
    })
    .collect();

    Catalog {
        methods,
        intensities,
    }
}

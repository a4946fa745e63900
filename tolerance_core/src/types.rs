//! Core domain types for the tolerance engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Consumption methods, strain categories and intensity tiers
//! - Logged consumption events and their ingestion checks
//! - Recommendation output values

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a tracked subject
pub type SubjectId = String;

/// Lowest accepted effect rating
pub const RATING_MIN: u8 = 1;

/// Highest accepted effect rating
pub const RATING_MAX: u8 = 10;

// ============================================================================
// Enumerations
// ============================================================================

/// How a dose was administered
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Smoking,
    Vaping,
    Edibles,
    Tinctures,
    Dabbing,
    Topicals,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Smoking,
        Method::Vaping,
        Method::Edibles,
        Method::Tinctures,
        Method::Dabbing,
        Method::Topicals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Smoking => "smoking",
            Method::Vaping => "vaping",
            Method::Edibles => "edibles",
            Method::Tinctures => "tinctures",
            Method::Dabbing => "dabbing",
            Method::Topicals => "topicals",
        }
    }

    /// Capitalised name for rendered text
    pub fn label(&self) -> &'static str {
        match self {
            Method::Smoking => "Smoking",
            Method::Vaping => "Vaping",
            Method::Edibles => "Edibles",
            Method::Tinctures => "Tinctures",
            Method::Dabbing => "Dabbing",
            Method::Topicals => "Topicals",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smoking" | "smoke" => Ok(Method::Smoking),
            "vaping" | "vape" | "vaporizer" => Ok(Method::Vaping),
            "edibles" | "edible" => Ok(Method::Edibles),
            "tinctures" | "tincture" => Ok(Method::Tinctures),
            "dabbing" | "dab" | "dabs" => Ok(Method::Dabbing),
            "topicals" | "topical" => Ok(Method::Topicals),
            other => Err(ValidationError::UnknownMethod(other.to_string())),
        }
    }
}

/// Strain category of the consumed product
///
/// Anything outside the three standard categories is kept as a
/// caller-defined tag.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Indica,
    Sativa,
    Hybrid,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Indica => "indica",
            Category::Sativa => "sativa",
            Category::Hybrid => "hybrid",
            Category::Other(tag) => tag,
        }
    }

    /// Capitalised name for rendered text
    pub fn label(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Category::Other(tag) if tag.trim().is_empty() => Err(ValidationError::EmptyCategory),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(ValidationError::EmptyCategory),
            "indica" => Ok(Category::Indica),
            "sativa" => Ok(Category::Sativa),
            "hybrid" => Ok(Category::Hybrid),
            other => Ok(Category::Other(other.to_string())),
        }
    }
}

/// Desired strength of effect, ordered weakest first
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IntensityTier {
    Microdose,
    Light,
    Moderate,
    Strong,
    VeryStrong,
}

impl IntensityTier {
    pub const ALL: [IntensityTier; 5] = [
        IntensityTier::Microdose,
        IntensityTier::Light,
        IntensityTier::Moderate,
        IntensityTier::Strong,
        IntensityTier::VeryStrong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityTier::Microdose => "microdose",
            IntensityTier::Light => "light",
            IntensityTier::Moderate => "moderate",
            IntensityTier::Strong => "strong",
            IntensityTier::VeryStrong => "very_strong",
        }
    }

    /// Human-readable name ("very strong")
    pub fn label(&self) -> &'static str {
        match self {
            IntensityTier::VeryStrong => "very strong",
            other => other.as_str(),
        }
    }

    /// Parse a tier name, falling back to `Moderate` for anything unrecognised
    pub fn parse_or_moderate(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown intensity tier '{}', falling back to moderate", s);
            IntensityTier::Moderate
        })
    }
}

impl fmt::Display for IntensityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntensityTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "microdose" | "micro" => Ok(IntensityTier::Microdose),
            "light" => Ok(IntensityTier::Light),
            "moderate" => Ok(IntensityTier::Moderate),
            "strong" => Ok(IntensityTier::Strong),
            "very_strong" | "verystrong" => Ok(IntensityTier::VeryStrong),
            other => Err(ValidationError::UnknownIntensity(other.to_string())),
        }
    }
}

/// Coarse tolerance band used in recommendation explanations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToleranceBand {
    Low,
    Moderate,
    High,
}

impl ToleranceBand {
    pub fn from_multiplier(multiplier: f64) -> Self {
        crate::catalog::TOLERANCE_BANDS.lookup(multiplier)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToleranceBand::Low => "low",
            ToleranceBand::Moderate => "moderate",
            ToleranceBand::High => "high",
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// A single logged consumption session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionEvent {
    pub occurred_at: DateTime<Utc>,
    pub dose_amount: f64,
    pub method: Method,
    pub category: Category,
    pub effect_rating: u8,
    pub duration_hours: f64,
}

impl ConsumptionEvent {
    pub fn new(
        occurred_at: DateTime<Utc>,
        dose_amount: f64,
        method: Method,
        category: Category,
        effect_rating: u8,
        duration_hours: f64,
    ) -> Self {
        Self {
            occurred_at,
            dose_amount,
            method,
            category,
            effect_rating,
            duration_hours,
        }
    }

    /// Placeholder session used to open a profile for a subject with no history
    pub fn seed(occurred_at: DateTime<Utc>) -> Self {
        Self::new(occurred_at, 5.0, Method::Vaping, Category::Hybrid, 7, 2.0)
    }

    /// Check the event against the ingestion rules
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.dose_amount.is_finite() || self.dose_amount < 0.0 {
            return Err(ValidationError::InvalidDose(self.dose_amount));
        }
        if !self.duration_hours.is_finite() || self.duration_hours < 0.0 {
            return Err(ValidationError::InvalidDuration(self.duration_hours));
        }
        if !(RATING_MIN..=RATING_MAX).contains(&self.effect_rating) {
            return Err(ValidationError::RatingOutOfRange {
                rating: self.effect_rating,
                min: RATING_MIN,
                max: RATING_MAX,
            });
        }
        self.category.validate()
    }
}

// ============================================================================
// Recommendation Types
// ============================================================================

/// When to consume relative to the subject's habits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingHint {
    /// Derived from the hour of day the subject usually logs sessions
    Personalized { hour: u32, delayed_onset: bool },
    /// No history to draw on
    Generic { delayed_onset: bool },
}

impl fmt::Display for TimingHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingHint::Personalized {
                hour,
                delayed_onset: true,
            } => write!(f, "Start around {}:00 (2h earlier to allow for slow onset)", hour),
            TimingHint::Personalized {
                hour,
                delayed_onset: false,
            } => write!(f, "Best around {}:00 based on your usual sessions", hour),
            TimingHint::Generic {
                delayed_onset: true,
            } => f.write_str("Start 2-3 hours before you want the effect"),
            TimingHint::Generic {
                delayed_onset: false,
            } => f.write_str("Evening sessions usually work best (6-8 PM)"),
        }
    }
}

/// Dose guidance for a requested intensity
#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub target: IntensityTier,
    /// Raw-product amount, rounded to one decimal place
    pub dose: f64,
    pub method: Method,
    pub category: Category,
    pub timing_hint: TimingHint,
    pub confidence: f64,
    /// Tolerance multiplier the dose was scaled by
    pub tolerance: f64,
    pub explanation: String,
}

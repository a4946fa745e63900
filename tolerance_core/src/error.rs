//! Error types for the tolerance_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Rejections raised when a consumption event fails ingestion checks.
///
/// Engine operations only ever fail with one of these; the remaining
/// [`Error`] variants belong to the host-side event log, export and config.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("dose amount must be a non-negative number, got {0}")]
    InvalidDose(f64),

    #[error("duration must be a non-negative number of hours, got {0}")]
    InvalidDuration(f64),

    #[error("effect rating {rating} is outside the {min}-{max} scale")]
    RatingOutOfRange { rating: u8, min: u8, max: u8 },

    #[error("unknown consumption method '{0}'")]
    UnknownMethod(String),

    #[error("category tag must not be empty")]
    EmptyCategory,

    #[error("unknown intensity tier '{0}'")]
    UnknownIntensity(String),

    #[error("subject id must not be empty")]
    EmptySubject,
}

/// Core error type for tolerance_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Event or query rejected by the engine
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

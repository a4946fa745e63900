#![forbid(unsafe_code)]

//! Core domain model and tolerance engine for tolr.
//!
//! This crate provides:
//! - Domain types (methods, categories, intensity tiers, consumption events)
//! - Lookup tables and breakpoint ladders
//! - The tolerance engine and per-subject profiles
//! - Derived insights and guidance text
//! - Host-side event log, replay and CSV export

pub mod types;
pub mod error;
pub mod ladder;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod profile;
pub mod engine;
pub mod insights;
pub mod advice;
pub mod wal;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result, ValidationError};
pub use types::*;
pub use catalog::get_default_catalog;
pub use config::Config;
pub use profile::SubjectProfile;
pub use engine::ToleranceEngine;
pub use wal::{EventSink, JsonlSink, LoggedEvent};
pub use history::load_engine;
pub use export::export_csv;

//! # Strokewatch
//!
//! Stroke risk scoring service: accepts patient health metrics, derives
//! engineered features, scores stroke risk with a pre-trained classifier,
//! persists every scored request to an append-only audit log, and returns a
//! structured risk assessment.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: core business types (patient records, feature derivation,
//!   risk categories)
//! - `ports`: trait definitions for external operations (classifier, store)
//! - `adapters`: concrete implementations (model artifact, SQLite, HTTP)
//! - `application`: the request-scoped scoring pipeline

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{PatientRecord, RiskCategory, ScoreResult};

/// Result type for strokewatch operations.
pub type Result<T> = std::result::Result<T, StrokewatchError>;

/// Main error type for strokewatch.
///
/// Taxonomy: `Validation` is client-caused and recoverable by correcting the
/// input; `Scoring` and `Store` are server-caused; `Startup` is fatal — the
/// process must not begin serving. Store failures on the write path are
/// never retried, since a retried write could duplicate audit records.
#[derive(Debug, thiserror::Error)]
pub enum StrokewatchError {
    #[error("Invalid patient record: {0}")]
    Validation(String),

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Storage operation failed: {0}")]
    Store(#[from] adapters::StoreError),

    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StrokewatchError {
    /// Whether this error is attributable to the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

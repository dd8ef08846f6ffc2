//! Store port: trait for the durable prediction audit log.
//!
//! The store is append-only: one record per successful scoring request,
//! never updated or deleted by this service, read back only for a bounded
//! most-recent-first listing.

use crate::domain::{PatientRecord, PredictionRecord, ScoreResult};

/// One prediction about to be persisted.
///
/// Borrows its parts from the request-scoped pipeline; the store assigns the
/// identifier and timestamp.
#[derive(Debug, Clone, Copy)]
pub struct NewPrediction<'a> {
    pub patient: &'a PatientRecord,
    pub result: &'a ScoreResult,
    /// The complete original request payload, kept verbatim for audit.
    pub payload: &'a serde_json::Value,
}

/// Trait for durable prediction storage.
pub trait PredictionStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Idempotently create the predictions table. Safe to run concurrently
    /// from multiple instances at startup.
    ///
    /// # Errors
    /// Returns error if the schema cannot be applied.
    fn ensure_schema(&self) -> Result<(), Self::Error>;

    /// Append one prediction atomically and return its generated identifier.
    ///
    /// Writes fail fast: a failed insert is surfaced, never retried, so an
    /// audit row can't be duplicated.
    ///
    /// # Errors
    /// Returns error if the write fails.
    fn insert(&self, prediction: &NewPrediction<'_>) -> Result<i64, Self::Error>;

    /// Load up to `limit` records, most recent first.
    ///
    /// # Errors
    /// Returns error if the read fails or a stored blob cannot be decoded.
    fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, Self::Error>;

    /// Total number of stored predictions.
    ///
    /// # Errors
    /// Returns error if the read fails.
    fn count(&self) -> Result<usize, Self::Error>;
}

//! Adapters layer: concrete implementations of ports.
//!
//! These modules contain the actual integration with external systems:
//! - `model`: the serialized classifier artifact
//! - `sqlite`: SQLite for the prediction audit log
//! - `http`: axum routing over the scoring service
//! - `sanitize`: PII filtering for logs

pub mod http;
pub mod model;
pub mod sanitize;
pub mod sqlite;

// Re-export errors folded into the crate error type.
pub use model::ModelError;
pub use sqlite::StoreError;

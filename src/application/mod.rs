//! Application layer: use cases and services.
//!
//! Orchestrates domain logic with ports to implement the scoring pipeline.

mod scoring;

pub use scoring::{contributing_factors, ScoredPrediction, ScoringService};

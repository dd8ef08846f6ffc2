//! Classifier port: trait for the opaque scoring capability.
//!
//! The loaded model artifact is consumed as a black box: a required
//! probability scorer plus optional introspection. Whether importances are
//! available is a capability check, not an error path — implementations
//! simply return `None` and callers branch on presence.

use crate::domain::FeatureVector;

/// Error type for a failed classifier call.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// The model references a feature the vector does not carry.
    #[error("Model requested unknown feature `{0}`")]
    UnknownFeature(String),

    /// A categorical value the model was not trained on.
    #[error("Unknown level `{value}` for categorical feature `{feature}`")]
    UnknownLevel { feature: String, value: String },

    /// The model produced something outside [0, 1] (or not a number at all).
    #[error("Model produced an invalid probability: {0}")]
    InvalidProbability(f64),

    /// Any other classifier-internal failure.
    #[error("Classifier failure: {0}")]
    Model(String),
}

/// Trait for the injected scoring capability.
///
/// Loaded once at process start and shared read-only across requests; no
/// method takes `&mut self`.
pub trait Classifier: Send + Sync {
    /// Score a complete feature vector, returning the positive-class
    /// probability in [0, 1].
    ///
    /// # Errors
    /// Returns `ScoringError` if the vector cannot be encoded for this model
    /// or the model output is invalid.
    fn score_probability(&self, features: &FeatureVector) -> Result<f64, ScoringError>;

    /// Feature names in the model's own training order, when exposed.
    fn feature_names(&self) -> Option<Vec<String>> {
        None
    }

    /// Per-feature importances aligned with `feature_names`, when exposed.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

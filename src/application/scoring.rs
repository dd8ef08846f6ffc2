//! Scoring service: orchestrates one request-scoped scoring pipeline.
//!
//! Each request runs validate → derive → score → persist → respond; any
//! step's failure short-circuits the rest, so nothing unscored or
//! unvalidated is ever persisted. The service itself never retries a step —
//! the only retry window in the system is the store's startup path.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::domain::{
    FeatureVector, PatientRecord, PredictionRecord, RiskCategory, ScoreResult, FACTORS_UNAVAILABLE,
};
use crate::ports::{Classifier, NewPrediction, PredictionStore};
use crate::{adapters::StoreError, Result, StrokewatchError};

/// Number of contributing factors reported per score.
const TOP_FACTORS: usize = 3;

/// A successfully scored and persisted request.
#[derive(Debug, Clone)]
pub struct ScoredPrediction {
    /// Identifier of the persisted audit record.
    pub prediction_id: i64,
    pub result: ScoreResult,
}

/// Service composing the classifier and the store into the request pipeline.
///
/// Both collaborators are shared read-only; concurrent requests are
/// independent.
pub struct ScoringService<C, S>
where
    C: Classifier,
    S: PredictionStore,
{
    classifier: Arc<C>,
    store: Arc<S>,
}

impl<C, S> ScoringService<C, S>
where
    C: Classifier,
    S: PredictionStore,
    S::Error: Into<StoreError>,
{
    /// Create a new scoring service.
    pub fn new(classifier: Arc<C>, store: Arc<S>) -> Self {
        Self { classifier, store }
    }

    /// Score one patient record end-to-end.
    ///
    /// # Errors
    /// - `Validation` for missing/out-of-domain input (client-caused)
    /// - `Scoring` if the classifier call fails (server-caused)
    /// - `Store` if the audit write fails (server-caused, not retried)
    pub fn score(&self, record: PatientRecord) -> Result<ScoredPrediction> {
        // Audit snapshot of the request exactly as received, before any
        // derived field is filled in.
        let payload = serde_json::to_value(&record)?;

        tracing::debug!("Step 1: validating record");
        record
            .validate()
            .map_err(|errors| StrokewatchError::Validation(errors.join("; ")))?;

        tracing::debug!("Step 2: deriving features");
        let features = FeatureVector::derive(record)
            .map_err(|errors| StrokewatchError::Validation(errors.join("; ")))?;

        tracing::debug!("Step 3: scoring");
        let probability = self
            .classifier
            .score_probability(&features)
            .map_err(|e| StrokewatchError::Scoring(e.to_string()))?;
        let result = ScoreResult {
            probability,
            risk_category: RiskCategory::from_probability(probability),
            contributing_factors: contributing_factors(self.classifier.as_ref()),
        };

        tracing::debug!("Step 4: persisting prediction");
        let prediction_id = self
            .store
            .insert(&NewPrediction {
                patient: features.record(),
                result: &result,
                payload: &payload,
            })
            .map_err(|e| StrokewatchError::Store(e.into()))?;

        tracing::info!(
            "Scored prediction {}: probability={:.4}, risk={}",
            prediction_id,
            result.probability,
            result.risk_category
        );

        Ok(ScoredPrediction {
            prediction_id,
            result,
        })
    }

    /// Load up to `limit` persisted predictions, most recent first, with the
    /// audit blobs decoded back into structured form.
    ///
    /// # Errors
    /// Returns `Store` if the read fails.
    pub fn recent_predictions(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
        self.store
            .recent(limit)
            .map_err(|e| StrokewatchError::Store(e.into()))
    }

    /// Total number of persisted predictions.
    ///
    /// # Errors
    /// Returns `Store` if the read fails.
    pub fn prediction_count(&self) -> Result<usize> {
        self.store
            .count()
            .map_err(|e| StrokewatchError::Store(e.into()))
    }
}

/// Extract the top contributing factors from a classifier's optional
/// introspection capability.
///
/// Stable sort, descending by importance; ties keep the model's own feature
/// order. A classifier without the capability (or with inconsistent
/// introspection data) yields the sentinel — this is a normal branch, not an
/// error.
pub fn contributing_factors<C: Classifier + ?Sized>(classifier: &C) -> Vec<String> {
    match (classifier.feature_names(), classifier.feature_importances()) {
        (Some(names), Some(importances))
            if !names.is_empty() && names.len() == importances.len() =>
        {
            let mut ranked: Vec<(String, f64)> = names.into_iter().zip(importances).collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
            ranked
                .into_iter()
                .take(TOP_FACTORS)
                .map(|(name, _)| name)
                .collect()
        }
        _ => vec![FACTORS_UNAVAILABLE.to_string()],
    }
}

//! Model adapter: implementation of `Classifier` from a serialized artifact.
//!
//! Loads the parameters exported by the training pipeline (a standardized
//! logistic model in JSON form) and scores feature vectors in process.
//!
//! # Integrity
//!
//! When a `<artifact>.sha256` sidecar file exists next to the artifact, its
//! digest must match the artifact bytes or the load fails. A missing sidecar
//! is accepted.
//!
//! # Encoding
//!
//! Categorical features are encoded ordinally via the artifact's per-feature
//! level tables, then every feature is standardized with the exported scaler
//! parameters. A categorical value absent from the level table is a
//! `ScoringError`: the model has no column for it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureVector, FieldValue};
use crate::ports::{Classifier, ScoringError};

/// Error type for model artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {detail}")]
    Read { path: PathBuf, detail: String },

    #[error("Invalid model artifact {path}: {detail}")]
    Format { path: PathBuf, detail: String },

    #[error("Checksum mismatch for model artifact {path}")]
    ChecksumMismatch { path: PathBuf },
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Human-readable model family, reported by the info endpoint.
    pub model_type: String,
    /// Feature names in training order.
    pub feature_names: Vec<String>,
    /// One coefficient per feature, applied to standardized values.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Standardization: z = (x - mean) * std_inv, per feature.
    pub scaler_mean: Vec<f64>,
    pub scaler_std_inv: Vec<f64>,
    /// Ordinal level tables for categorical features.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    /// Per-feature importances, present only for model families that
    /// export them.
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

/// A loaded, read-only scoring model.
///
/// Constructed once at startup and shared behind `Arc`; never mutated after
/// load, so concurrent readers need no synchronization.
#[derive(Debug)]
pub struct LogisticModel {
    artifact: ModelArtifact,
}

impl LogisticModel {
    /// Load and verify a model artifact from disk.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, fails its checksum, or does
    /// not describe a consistent model.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path).map_err(|e| ModelError::Read {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        verify_checksum(path, &bytes)?;

        let artifact: ModelArtifact =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::Format {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let model = Self::from_artifact(artifact).map_err(|detail| ModelError::Format {
            path: path.to_path_buf(),
            detail,
        })?;

        tracing::info!(
            "Loaded {} model with {} features from {}",
            model.model_type(),
            model.feature_count(),
            path.display()
        );
        Ok(model)
    }

    /// Build a model from already-parsed parameters, checking consistency.
    ///
    /// # Errors
    /// Returns a description of the first dimension mismatch.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, String> {
        let n = artifact.feature_names.len();
        if n == 0 {
            return Err("model declares no features".to_string());
        }
        for (table, len) in [
            ("coefficients", artifact.coefficients.len()),
            ("scaler_mean", artifact.scaler_mean.len()),
            ("scaler_std_inv", artifact.scaler_std_inv.len()),
        ] {
            if len != n {
                return Err(format!("{table} has {len} entries for {n} features"));
            }
        }
        if let Some(importances) = &artifact.feature_importances {
            if importances.len() != n {
                return Err(format!(
                    "feature_importances has {} entries for {n} features",
                    importances.len()
                ));
            }
        }
        Ok(Self { artifact })
    }

    #[must_use]
    pub fn model_type(&self) -> &str {
        &self.artifact.model_type
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.artifact.feature_names.len()
    }

    /// Encode a feature vector into the model's numeric column order.
    fn encode(&self, features: &FeatureVector) -> Result<Vec<f64>, ScoringError> {
        self.artifact
            .feature_names
            .iter()
            .map(|name| {
                let value = features
                    .field(name)
                    .ok_or_else(|| ScoringError::UnknownFeature(name.clone()))?;
                match value {
                    FieldValue::Number(v) => Ok(v),
                    FieldValue::Text(text) => {
                        let levels = self
                            .artifact
                            .categories
                            .get(name)
                            .ok_or_else(|| ScoringError::UnknownFeature(name.clone()))?;
                        levels
                            .iter()
                            .position(|level| level == text)
                            .map(|index| index as f64)
                            .ok_or_else(|| ScoringError::UnknownLevel {
                                feature: name.clone(),
                                value: text.to_string(),
                            })
                    }
                }
            })
            .collect()
    }
}

impl Classifier for LogisticModel {
    fn score_probability(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        let encoded = self.encode(features)?;

        let mut z = self.artifact.intercept;
        for (i, x) in encoded.iter().enumerate() {
            let standardized = (x - self.artifact.scaler_mean[i]) * self.artifact.scaler_std_inv[i];
            z += self.artifact.coefficients[i] * standardized;
        }

        let probability = sigmoid(z);
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::InvalidProbability(probability));
        }
        Ok(probability)
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        Some(self.artifact.feature_names.clone())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.artifact.feature_importances.clone()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Verify the artifact against its optional `.sha256` sidecar.
fn verify_checksum(path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(".sha256");
    let sidecar = PathBuf::from(sidecar);

    if !sidecar.exists() {
        tracing::debug!("No checksum sidecar for {}", path.display());
        return Ok(());
    }

    let content = fs::read_to_string(&sidecar).map_err(|e| ModelError::Read {
        path: sidecar.clone(),
        detail: e.to_string(),
    })?;
    let expected = content
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut actual = String::with_capacity(64);
    for byte in Sha256::digest(bytes) {
        actual.push_str(&format!("{byte:02x}"));
    }

    if expected != actual {
        return Err(ModelError::ChecksumMismatch {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, PatientRecord};
    use std::io::Write;

    fn test_artifact() -> ModelArtifact {
        ModelArtifact {
            model_type: "LogisticRegression".to_string(),
            feature_names: vec!["age".to_string(), "age_group".to_string()],
            coefficients: vec![1.0, 0.5],
            intercept: -1.0,
            scaler_mean: vec![50.0, 0.0],
            scaler_std_inv: vec![0.02, 1.0],
            categories: BTreeMap::from([(
                "age_group".to_string(),
                vec![
                    "Young adult".to_string(),
                    "Middle-aged".to_string(),
                    "Very old".to_string(),
                ],
            )]),
            feature_importances: None,
        }
    }

    fn test_features(age: f64) -> FeatureVector {
        let record = PatientRecord {
            gender: Gender::Female,
            age,
            hypertension: 0,
            heart_disease: 0,
            avg_glucose_level: 95.2,
            bmi: 26.8,
            smoking_status: "never smoked".to_string(),
            name: "Jane Smith".to_string(),
            country: "Canada".to_string(),
            province: "Ontario".to_string(),
            age_group: None,
            bmi_category: None,
            glucose_category: None,
            age_hypertension: None,
        };
        FeatureVector::derive(record).expect("Should derive")
    }

    #[test]
    fn test_score_known_value() {
        let model = LogisticModel::from_artifact(test_artifact()).expect("Should build");
        // age 50 -> z = -1 + 1.0*(50-50)*0.02 + 0.5*(1-0)*1.0 = -0.5
        let probability = model
            .score_probability(&test_features(50.0))
            .expect("Should score");
        let expected = 1.0 / (1.0 + 0.5_f64.exp());
        assert!((probability - expected).abs() < 1e-12);
    }

    #[test]
    fn test_probability_in_unit_interval() {
        let model = LogisticModel::from_artifact(test_artifact()).expect("Should build");
        for age in [0.0, 25.0, 50.0, 79.0, 119.0] {
            let p = model
                .score_probability(&test_features(age))
                .expect("Should score");
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_unknown_level_is_scoring_error() {
        let mut artifact = test_artifact();
        artifact
            .categories
            .get_mut("age_group")
            .expect("Should have levels")
            .retain(|level| level != "Young adult");
        let model = LogisticModel::from_artifact(artifact).expect("Should build");
        let err = model
            .score_probability(&test_features(30.0))
            .expect_err("Should reject untrained level");
        assert!(matches!(err, ScoringError::UnknownLevel { .. }));
    }

    #[test]
    fn test_unknown_feature_is_scoring_error() {
        let mut artifact = test_artifact();
        artifact.feature_names[0] = "shoe_size".to_string();
        let model = LogisticModel::from_artifact(artifact).expect("Should build");
        let err = model
            .score_probability(&test_features(30.0))
            .expect_err("Should reject unknown feature");
        assert!(matches!(err, ScoringError::UnknownFeature(_)));
    }

    #[test]
    fn test_dimension_mismatch_rejected_at_load() {
        let mut artifact = test_artifact();
        artifact.coefficients.push(0.1);
        assert!(LogisticModel::from_artifact(artifact).is_err());
    }

    #[test]
    fn test_importances_capability_absent_by_default() {
        let model = LogisticModel::from_artifact(test_artifact()).expect("Should build");
        assert!(model.feature_importances().is_none());
        assert_eq!(model.feature_names().expect("Should expose names").len(), 2);
    }

    #[test]
    fn test_load_with_matching_checksum() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let path = dir.path().join("model.json");
        let bytes = serde_json::to_vec(&test_artifact()).expect("Should serialize");
        fs::write(&path, &bytes).expect("Should write artifact");

        let mut digest = String::new();
        for byte in Sha256::digest(&bytes) {
            digest.push_str(&format!("{byte:02x}"));
        }
        let mut sidecar =
            fs::File::create(dir.path().join("model.json.sha256")).expect("Should create sidecar");
        writeln!(sidecar, "{digest}  model.json").expect("Should write sidecar");

        assert!(LogisticModel::load(&path).is_ok());
    }

    #[test]
    fn test_load_with_wrong_checksum() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            serde_json::to_vec(&test_artifact()).expect("Should serialize"),
        )
        .expect("Should write artifact");
        fs::write(dir.path().join("model.json.sha256"), "deadbeef\n").expect("Should write sidecar");

        let err = LogisticModel::load(&path).expect_err("Should reject bad checksum");
        assert!(matches!(err, ModelError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_load_missing_artifact() {
        let err = LogisticModel::load(Path::new("definitely/not/here.json"))
            .expect_err("Should fail to read");
        assert!(matches!(err, ModelError::Read { .. }));
    }
}

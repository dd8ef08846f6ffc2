//! Scoring result and audit record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel contributing-factor entry for classifiers without importance
/// introspection.
pub const FACTORS_UNAVAILABLE: &str = "Feature importance not available";

/// Coarse risk bucket derived from the predicted probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    /// probability < 0.30
    Low,
    /// 0.30 <= probability < 0.70
    Medium,
    /// probability >= 0.70
    High,
}

impl RiskCategory {
    /// Map a probability to its category. Total over [0, 1]; boundaries are
    /// inclusive on the lower edge.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            Self::Low
        } else if probability < 0.7 {
            Self::Medium
        } else {
            Self::High
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parse a stored category label, defaulting to `Medium` for anything
    /// unrecognized (mirrors how unknown rows are treated on read-back).
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "Low" => Self::Low,
            "High" => Self::High,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one scoring pass. Created once per request, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Positive-class probability in [0, 1].
    pub probability: f64,
    pub risk_category: RiskCategory,
    /// Up to 3 feature names ordered by importance, or the single
    /// `FACTORS_UNAVAILABLE` sentinel.
    pub contributing_factors: Vec<String>,
}

/// Durable audit entry for one scored request.
///
/// Append-only: written exactly once per successful request, read back only
/// for bounded most-recent-first listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub gender: String,
    pub age: f64,
    pub hypertension: u8,
    pub heart_disease: u8,
    pub avg_glucose_level: f64,
    pub bmi: f64,
    pub smoking_status: String,
    pub name: String,
    pub country: String,
    pub province: String,
    pub probability: f64,
    pub risk_category: RiskCategory,
    pub contributing_factors: Vec<String>,
    /// The original request payload, decoded back from its audit blob.
    pub prediction_data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_thresholds_exact() {
        assert_eq!(RiskCategory::from_probability(0.0), RiskCategory::Low);
        assert_eq!(RiskCategory::from_probability(0.29999), RiskCategory::Low);
        assert_eq!(RiskCategory::from_probability(0.3), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_probability(0.5), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_probability(0.69999), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_probability(0.7), RiskCategory::High);
        assert_eq!(RiskCategory::from_probability(1.0), RiskCategory::High);
    }

    #[test]
    fn test_category_labels_roundtrip() {
        for category in [RiskCategory::Low, RiskCategory::Medium, RiskCategory::High] {
            assert_eq!(RiskCategory::from_str_lossy(category.as_str()), category);
        }
        assert_eq!(RiskCategory::from_str_lossy("???"), RiskCategory::Medium);
    }

    #[test]
    fn test_score_result_serializes_category_as_label() {
        let result = ScoreResult {
            probability: 0.82,
            risk_category: RiskCategory::High,
            contributing_factors: vec![FACTORS_UNAVAILABLE.to_string()],
        };
        let value = serde_json::to_value(&result).expect("Should serialize");
        assert_eq!(value["risk_category"], "High");
    }
}

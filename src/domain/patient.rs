//! Patient record types for stroke risk prediction.
//!
//! A `PatientRecord` is the raw request payload. The four engineered fields
//! are optional on input: when omitted they are derived deterministically
//! (see `features`), when supplied they are trusted as-is.

use serde::{Deserialize, Serialize};

/// Patient gender as reported in the source dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw patient record as submitted by the caller.
///
/// Numeric domains (enforced by `validate`):
/// - age in [0, 120)
/// - avg_glucose_level in [0, 300)
/// - bmi in [0, 100)
/// - hypertension / heart_disease in {0, 1}
///
/// `smoking_status` is free-form text; the classifier rejects levels it was
/// not trained on at scoring time. `name`, `country` and `province` are
/// identifiers, not model features, and are not checked against any
/// reference list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub gender: Gender,
    pub age: f64,
    pub hypertension: u8,
    pub heart_disease: u8,
    pub avg_glucose_level: f64,
    pub bmi: f64,
    pub smoking_status: String,
    pub name: String,
    pub country: String,
    pub province: String,

    /// Pre-derived age bucket; filled from `age` when omitted.
    #[serde(default)]
    pub age_group: Option<String>,

    /// Pre-derived BMI bucket; filled from `bmi` when omitted.
    #[serde(default)]
    pub bmi_category: Option<String>,

    /// Pre-derived glucose bucket; filled from `avg_glucose_level` when omitted.
    #[serde(default)]
    pub glucose_category: Option<String>,

    /// Age × hypertension interaction term; computed when omitted.
    #[serde(default)]
    pub age_hypertension: Option<f64>,
}

impl PatientRecord {
    /// Validate that all fields are within their expected domains.
    ///
    /// # Errors
    /// Returns every violation as a human-readable string.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.age.is_finite() || !(0.0..120.0).contains(&self.age) {
            errors.push(format!("Age {} out of range [0, 120)", self.age));
        }
        if self.hypertension > 1 {
            errors.push(format!("Hypertension {} must be 0 or 1", self.hypertension));
        }
        if self.heart_disease > 1 {
            errors.push(format!("Heart disease {} must be 0 or 1", self.heart_disease));
        }
        if !self.avg_glucose_level.is_finite() || !(0.0..300.0).contains(&self.avg_glucose_level) {
            errors.push(format!(
                "Average glucose level {} out of range [0, 300)",
                self.avg_glucose_level
            ));
        }
        if !self.bmi.is_finite() || !(0.0..100.0).contains(&self.bmi) {
            errors.push(format!("BMI {} out of range [0, 100)", self.bmi));
        }
        for (field, value) in [
            ("name", &self.name),
            ("country", &self.country),
            ("province", &self.province),
            ("smoking_status", &self.smoking_status),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("Field `{field}` must not be empty"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

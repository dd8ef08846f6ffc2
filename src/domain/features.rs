//! Engineered feature derivation.
//!
//! Buckets raw numeric inputs into the categorical bins the classifier was
//! trained on and computes the age × hypertension interaction term. All bin
//! edges are left-inclusive, right-exclusive; a value at or beyond the upper
//! edge of the declared domain is an error, never clamped.
//!
//! Derivation is a pure function: the same record always produces the same
//! `FeatureVector`, and caller-supplied derived fields are passed through
//! untouched.

use crate::domain::PatientRecord;

/// Age bucket over [0, 120).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    YoungAdult,
    MiddleAged,
    VeryOld,
}

impl AgeGroup {
    /// Bucket an age, or `None` when outside [0, 120).
    #[must_use]
    pub fn from_age(age: f64) -> Option<Self> {
        match age {
            a if (0.0..50.0).contains(&a) => Some(Self::YoungAdult),
            a if (50.0..80.0).contains(&a) => Some(Self::MiddleAged),
            a if (80.0..120.0).contains(&a) => Some(Self::VeryOld),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::YoungAdult => "Young adult",
            Self::MiddleAged => "Middle-aged",
            Self::VeryOld => "Very old",
        }
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// BMI bucket over [0, 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    HealthyWeight,
    Overweight,
    Class1Obesity,
    Class2Obesity,
    Class3Obesity,
}

impl BmiCategory {
    /// Bucket a BMI, or `None` when outside [0, 100).
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Option<Self> {
        match bmi {
            b if (0.0..18.5).contains(&b) => Some(Self::Underweight),
            b if (18.5..25.0).contains(&b) => Some(Self::HealthyWeight),
            b if (25.0..30.0).contains(&b) => Some(Self::Overweight),
            b if (30.0..35.0).contains(&b) => Some(Self::Class1Obesity),
            b if (35.0..40.0).contains(&b) => Some(Self::Class2Obesity),
            b if (40.0..100.0).contains(&b) => Some(Self::Class3Obesity),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::HealthyWeight => "Healthy Weight",
            Self::Overweight => "Overweight",
            Self::Class1Obesity => "Class 1 Obesity",
            Self::Class2Obesity => "Class 2 Obesity",
            Self::Class3Obesity => "Class 3 Obesity",
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Average glucose bucket over [0, 300).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseCategory {
    Hypoglycemia,
    LowNormal,
    Normal,
    Elevated,
    PreDiabetic,
    BorderlineDiabetic,
    Diabetic,
}

impl GlucoseCategory {
    /// Bucket an average glucose level, or `None` when outside [0, 300).
    #[must_use]
    pub fn from_glucose(level: f64) -> Option<Self> {
        match level {
            g if (0.0..70.0).contains(&g) => Some(Self::Hypoglycemia),
            g if (70.0..85.0).contains(&g) => Some(Self::LowNormal),
            g if (85.0..100.0).contains(&g) => Some(Self::Normal),
            g if (100.0..110.0).contains(&g) => Some(Self::Elevated),
            g if (110.0..126.0).contains(&g) => Some(Self::PreDiabetic),
            g if (126.0..140.0).contains(&g) => Some(Self::BorderlineDiabetic),
            g if (140.0..300.0).contains(&g) => Some(Self::Diabetic),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Hypoglycemia => "Hypoglycemia",
            Self::LowNormal => "Low Normal",
            Self::Normal => "Normal",
            Self::Elevated => "Elevated",
            Self::PreDiabetic => "Pre-diabetic",
            Self::BorderlineDiabetic => "Borderline Diabetic",
            Self::Diabetic => "Diabetic",
        }
    }
}

impl std::fmt::Display for GlucoseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single feature value as seen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
}

/// Complete feature set: the raw record plus the four derived fields.
///
/// Immutable once built; the only way to construct one is `derive`, which
/// fills any derived field the caller omitted.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    record: PatientRecord,
    age_group: String,
    bmi_category: String,
    glucose_category: String,
    age_hypertension: f64,
}

impl FeatureVector {
    /// Build the feature vector for a record, deriving omitted fields.
    ///
    /// Supplied derived fields are trusted as-is and never recomputed.
    ///
    /// # Errors
    /// Returns every out-of-domain violation as a human-readable string.
    pub fn derive(record: PatientRecord) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();

        let age_group = match &record.age_group {
            Some(supplied) => supplied.clone(),
            None => match AgeGroup::from_age(record.age) {
                Some(group) => group.to_string(),
                None => {
                    errors.push(format!("Age {} outside the bucketed range [0, 120)", record.age));
                    String::new()
                }
            },
        };

        let bmi_category = match &record.bmi_category {
            Some(supplied) => supplied.clone(),
            None => match BmiCategory::from_bmi(record.bmi) {
                Some(category) => category.to_string(),
                None => {
                    errors.push(format!("BMI {} outside the bucketed range [0, 100)", record.bmi));
                    String::new()
                }
            },
        };

        let glucose_category = match &record.glucose_category {
            Some(supplied) => supplied.clone(),
            None => match GlucoseCategory::from_glucose(record.avg_glucose_level) {
                Some(category) => category.to_string(),
                None => {
                    errors.push(format!(
                        "Average glucose level {} outside the bucketed range [0, 300)",
                        record.avg_glucose_level
                    ));
                    String::new()
                }
            },
        };

        let age_hypertension = record
            .age_hypertension
            .unwrap_or_else(|| record.age * f64::from(record.hypertension));

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            record,
            age_group,
            bmi_category,
            glucose_category,
            age_hypertension,
        })
    }

    /// The raw record this vector was derived from.
    #[must_use]
    pub fn record(&self) -> &PatientRecord {
        &self.record
    }

    #[must_use]
    pub fn age_group(&self) -> &str {
        &self.age_group
    }

    #[must_use]
    pub fn bmi_category(&self) -> &str {
        &self.bmi_category
    }

    #[must_use]
    pub fn glucose_category(&self) -> &str {
        &self.glucose_category
    }

    #[must_use]
    pub fn age_hypertension(&self) -> f64 {
        self.age_hypertension
    }

    /// Look up a model feature by name.
    ///
    /// Identifier fields (`name`, `country`, `province`) are not model
    /// features and resolve to `None`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "gender" => Some(FieldValue::Text(self.record.gender.as_str())),
            "age" => Some(FieldValue::Number(self.record.age)),
            "hypertension" => Some(FieldValue::Number(f64::from(self.record.hypertension))),
            "heart_disease" => Some(FieldValue::Number(f64::from(self.record.heart_disease))),
            "avg_glucose_level" => Some(FieldValue::Number(self.record.avg_glucose_level)),
            "bmi" => Some(FieldValue::Number(self.record.bmi)),
            "smoking_status" => Some(FieldValue::Text(&self.record.smoking_status)),
            "age_group" => Some(FieldValue::Text(&self.age_group)),
            "bmi_category" => Some(FieldValue::Text(&self.bmi_category)),
            "glucose_category" => Some(FieldValue::Text(&self.glucose_category)),
            "age_hypertension" => Some(FieldValue::Number(self.age_hypertension)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;

    fn record(age: f64, glucose: f64, bmi: f64, hypertension: u8) -> PatientRecord {
        PatientRecord {
            gender: Gender::Male,
            age,
            hypertension,
            heart_disease: 0,
            avg_glucose_level: glucose,
            bmi,
            smoking_status: "never smoked".to_string(),
            name: "John Doe".to_string(),
            country: "United States".to_string(),
            province: "California".to_string(),
            age_group: None,
            bmi_category: None,
            glucose_category: None,
            age_hypertension: None,
        }
    }

    #[test]
    fn test_age_bucket_boundaries() {
        assert_eq!(AgeGroup::from_age(0.0), Some(AgeGroup::YoungAdult));
        assert_eq!(AgeGroup::from_age(45.5), Some(AgeGroup::YoungAdult));
        assert_eq!(AgeGroup::from_age(49.999), Some(AgeGroup::YoungAdult));
        assert_eq!(AgeGroup::from_age(50.0), Some(AgeGroup::MiddleAged));
        assert_eq!(AgeGroup::from_age(79.999), Some(AgeGroup::MiddleAged));
        assert_eq!(AgeGroup::from_age(80.0), Some(AgeGroup::VeryOld));
        assert_eq!(AgeGroup::from_age(119.999), Some(AgeGroup::VeryOld));
        assert_eq!(AgeGroup::from_age(120.0), None);
        assert_eq!(AgeGroup::from_age(-0.001), None);
    }

    #[test]
    fn test_bmi_bucket_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.5), Some(BmiCategory::HealthyWeight));
        assert_eq!(BmiCategory::from_bmi(26.8), Some(BmiCategory::Overweight));
        assert_eq!(BmiCategory::from_bmi(40.0), Some(BmiCategory::Class3Obesity));
        assert_eq!(BmiCategory::from_bmi(100.0), None);
    }

    #[test]
    fn test_glucose_bucket_boundaries() {
        assert_eq!(GlucoseCategory::from_glucose(69.999), Some(GlucoseCategory::Hypoglycemia));
        assert_eq!(GlucoseCategory::from_glucose(95.2), Some(GlucoseCategory::Normal));
        assert_eq!(GlucoseCategory::from_glucose(126.0), Some(GlucoseCategory::BorderlineDiabetic));
        assert_eq!(GlucoseCategory::from_glucose(140.0), Some(GlucoseCategory::Diabetic));
        assert_eq!(GlucoseCategory::from_glucose(300.0), None);
    }

    #[test]
    fn test_derivation_fills_omitted_fields() {
        let features = FeatureVector::derive(record(45.5, 95.2, 26.8, 0)).expect("Should derive");
        assert_eq!(features.age_group(), "Young adult");
        assert_eq!(features.bmi_category(), "Overweight");
        assert_eq!(features.glucose_category(), "Normal");
        assert!((features.age_hypertension() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_interaction_term() {
        let features = FeatureVector::derive(record(62.0, 95.2, 26.8, 1)).expect("Should derive");
        assert!((features.age_hypertension() - 62.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_supplied_fields_are_trusted() {
        let mut input = record(45.5, 95.2, 26.8, 0);
        input.age_group = Some("Very old".to_string());
        input.age_hypertension = Some(7.5);
        let features = FeatureVector::derive(input).expect("Should derive");
        // Deliberately inconsistent with age 45.5; supplied values win.
        assert_eq!(features.age_group(), "Very old");
        assert!((features.age_hypertension() - 7.5).abs() < f64::EPSILON);
        assert_eq!(features.bmi_category(), "Overweight");
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let input = record(52.0, 112.0, 31.5, 1);
        let first = FeatureVector::derive(input.clone()).expect("Should derive");
        let second = FeatureVector::derive(input).expect("Should derive");
        assert_eq!(first.age_group(), second.age_group());
        assert_eq!(first.bmi_category(), second.bmi_category());
        assert_eq!(first.glucose_category(), second.glucose_category());
        assert!((first.age_hypertension() - second.age_hypertension()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_domain_collects_all_errors() {
        let errors = FeatureVector::derive(record(120.0, 300.0, 100.0, 0))
            .expect_err("Should reject out-of-domain values");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_field_lookup() {
        let features = FeatureVector::derive(record(45.5, 95.2, 26.8, 0)).expect("Should derive");
        assert_eq!(features.field("age"), Some(FieldValue::Number(45.5)));
        assert_eq!(features.field("gender"), Some(FieldValue::Text("Male")));
        assert_eq!(features.field("age_group"), Some(FieldValue::Text("Young adult")));
        assert_eq!(features.field("name"), None);
        assert_eq!(features.field("unknown"), None);
    }
}

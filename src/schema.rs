//! Fixed feature schema for student records
//!
//! The model is trained against exactly one schema: 20 features in a fixed
//! canonical order, 10 of them categorical with enumerated domains. The
//! column order here is also the column order of persisted dataset
//! snapshots, with the target column appended last.

use crate::error::{GradecastError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Canonical feature order expected by the trained model.
pub const FEATURE_NAMES: [&str; 20] = [
    "age",
    "sex",
    "address",
    "famsize",
    "parentStatus",
    "motherEdu",
    "fatherEdu",
    "studyTime",
    "pastFailures",
    "schoolSupport",
    "familySupport",
    "paidClasses",
    "activities",
    "internetAccess",
    "romantic",
    "familyQuality",
    "freeTime",
    "goOut",
    "health",
    "absences",
];

/// Features that carry string categories and require encoding.
pub const CATEGORICAL_FEATURES: [&str; 10] = [
    "sex",
    "address",
    "famsize",
    "parentStatus",
    "schoolSupport",
    "familySupport",
    "paidClasses",
    "activities",
    "internetAccess",
    "romantic",
];

/// Name of the binary label column in generated datasets.
pub const TARGET_COLUMN: &str = "outcome";

/// Whether a feature is categorical (encoded) rather than numeric.
pub fn is_categorical(feature: &str) -> bool {
    CATEGORICAL_FEATURES.contains(&feature)
}

/// One incoming student record at the serving boundary.
///
/// Every field is optional: absent fields are default-filled downstream, and
/// unknown fields in the incoming payload are ignored. Categorical fields
/// accept any JSON scalar (numbers and bools are stringified and will simply
/// miss the fitted vocabulary), while a non-numeric value in a numeric field
/// is a deserialization error and the request is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub age: Option<f64>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub famsize: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub parent_status: Option<String>,
    pub mother_edu: Option<f64>,
    pub father_edu: Option<f64>,
    pub study_time: Option<f64>,
    pub past_failures: Option<f64>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub school_support: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub family_support: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub paid_classes: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub activities: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub internet_access: Option<String>,
    #[serde(default, deserialize_with = "lenient_category")]
    pub romantic: Option<String>,
    pub family_quality: Option<f64>,
    pub free_time: Option<f64>,
    pub go_out: Option<f64>,
    pub health: Option<f64>,
    pub absences: Option<f64>,
}

/// Accept strings, numbers, and bools for categorical fields.
///
/// A number where a category belongs is stringified rather than rejected: it
/// will fall outside the fitted vocabulary and take the fallback code, which
/// keeps a single miscoded field from failing the whole request. Arrays and
/// objects are structurally invalid and still rejected.
fn lenient_category<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar category value, got {other}"
        ))),
    }
}

impl StudentRecord {
    /// Parse a record from a flat JSON object, rejecting malformed payloads.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| GradecastError::InvalidInput(format!("malformed record: {e}")))
    }

    /// Raw categorical value for a feature name, if present.
    pub fn categorical_value(&self, feature: &str) -> Option<&str> {
        match feature {
            "sex" => self.sex.as_deref(),
            "address" => self.address.as_deref(),
            "famsize" => self.famsize.as_deref(),
            "parentStatus" => self.parent_status.as_deref(),
            "schoolSupport" => self.school_support.as_deref(),
            "familySupport" => self.family_support.as_deref(),
            "paidClasses" => self.paid_classes.as_deref(),
            "activities" => self.activities.as_deref(),
            "internetAccess" => self.internet_access.as_deref(),
            "romantic" => self.romantic.as_deref(),
            _ => None,
        }
    }

    /// Numeric value for a feature name, if present.
    pub fn numeric_value(&self, feature: &str) -> Option<f64> {
        match feature {
            "age" => self.age,
            "motherEdu" => self.mother_edu,
            "fatherEdu" => self.father_edu,
            "studyTime" => self.study_time,
            "pastFailures" => self.past_failures,
            "familyQuality" => self.family_quality,
            "freeTime" => self.free_time,
            "goOut" => self.go_out,
            "health" => self.health,
            "absences" => self.absences,
            _ => None,
        }
    }
}

/// Valid range of a numeric feature, for client-side form validation.
#[derive(Debug, Clone, Serialize)]
pub struct NumericFeature {
    pub min: i64,
    pub max: i64,
    pub description: &'static str,
}

/// Read-only feature metadata exposed to clients.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureInfo {
    pub categorical_features: BTreeMap<&'static str, Vec<&'static str>>,
    pub numerical_features: BTreeMap<&'static str, NumericFeature>,
}

/// Enumerate each categorical domain and numeric range of the schema.
pub fn feature_info() -> FeatureInfo {
    let mut categorical = BTreeMap::new();
    categorical.insert("sex", vec!["M", "F"]);
    categorical.insert("address", vec!["U", "R"]);
    categorical.insert("famsize", vec!["LE3", "GT3"]);
    categorical.insert("parentStatus", vec!["T", "A"]);
    categorical.insert("schoolSupport", vec!["yes", "no"]);
    categorical.insert("familySupport", vec!["yes", "no"]);
    categorical.insert("paidClasses", vec!["yes", "no"]);
    categorical.insert("activities", vec!["yes", "no"]);
    categorical.insert("internetAccess", vec!["yes", "no"]);
    categorical.insert("romantic", vec!["yes", "no"]);

    let mut numerical = BTreeMap::new();
    numerical.insert("age", NumericFeature { min: 15, max: 19, description: "Student age" });
    numerical.insert("motherEdu", NumericFeature { min: 0, max: 4, description: "Mother education level" });
    numerical.insert("fatherEdu", NumericFeature { min: 0, max: 4, description: "Father education level" });
    numerical.insert("studyTime", NumericFeature { min: 1, max: 4, description: "Weekly study time" });
    numerical.insert("pastFailures", NumericFeature { min: 0, max: 3, description: "Number of past class failures" });
    numerical.insert("familyQuality", NumericFeature { min: 1, max: 5, description: "Quality of family relationships" });
    numerical.insert("freeTime", NumericFeature { min: 1, max: 5, description: "Free time after school" });
    numerical.insert("goOut", NumericFeature { min: 1, max: 5, description: "Going out with friends" });
    numerical.insert("health", NumericFeature { min: 1, max: 5, description: "Current health status" });
    numerical.insert("absences", NumericFeature { min: 0, max: 20, description: "Number of school absences" });

    FeatureInfo {
        categorical_features: categorical,
        numerical_features: numerical,
    }
}

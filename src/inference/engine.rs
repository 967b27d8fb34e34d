//! Inference engine for single-record predictions

use crate::error::{GradecastError, Result};
use crate::preprocessing::EncoderSet;
use crate::schema::{is_categorical, StudentRecord, FEATURE_NAMES};
use crate::training::ModelArtifact;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Number of ranked features included in a prediction's explanation.
const TOP_FACTOR_COUNT: usize = 5;

/// Default for any feature the caller left out. For categoricals this is
/// the fallback code; for numerics it is simply zero. Serving stays
/// available on partial input at the cost of prediction quality.
const DEFAULT_FEATURE_VALUE: f64 = 0.0;

/// Per-class probability pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeProbability {
    pub fail: f64,
    pub pass: f64,
}

/// One entry of the importance-based explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopFactor {
    pub feature: String,
    pub importance: f64,
}

/// Full prediction payload returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: u8,
    pub prediction_text: String,
    pub probability: OutcomeProbability,
    pub confidence: f64,
    pub top_factors: Vec<TopFactor>,
}

/// Read-only serving engine over a trained artifact.
///
/// The artifact and encoders sit behind `Arc`, so clones are cheap and
/// many threads can serve predictions concurrently without locking.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    artifact: Arc<ModelArtifact>,
    encoders: Arc<EncoderSet>,
}

impl InferenceEngine {
    pub fn new(artifact: ModelArtifact, encoders: EncoderSet) -> Self {
        Self {
            artifact: Arc::new(artifact),
            encoders: Arc::new(encoders),
        }
    }

    /// Load the model and encoder artifacts persisted by a training run.
    pub fn from_files(model_path: &Path, encoders_path: &Path) -> Result<Self> {
        let artifact = ModelArtifact::load(model_path)?;
        let encoders = EncoderSet::load(encoders_path)?;
        Ok(Self::new(artifact, encoders))
    }

    /// Predict the outcome for one (possibly partial) student record.
    pub fn predict(&self, record: &StudentRecord) -> Result<PredictionResult> {
        let features = self.feature_vector(record);
        let x = Array2::from_shape_vec((1, FEATURE_NAMES.len()), features).map_err(|e| {
            GradecastError::ShapeError {
                expected: format!("1x{}", FEATURE_NAMES.len()),
                actual: e.to_string(),
            }
        })?;

        let proba = self.artifact.forest.predict_proba(&x)?;
        let fail = proba[[0, 0]];
        let pass = proba[[0, 1]];

        // Tie resolves to Fail, matching the forest's own vote rule
        let prediction: u8 = if pass > fail { 1 } else { 0 };
        let prediction_text = if prediction == 1 { "Pass" } else { "Fail" };
        let confidence = fail.max(pass);

        debug!(prediction = prediction_text, confidence, "served prediction");

        Ok(PredictionResult {
            prediction,
            prediction_text: prediction_text.to_string(),
            probability: OutcomeProbability { fail, pass },
            confidence,
            top_factors: self.top_factors(),
        })
    }

    /// Build the model input in canonical feature order. Missing fields
    /// take the default value; unseen categories take the fallback code.
    fn feature_vector(&self, record: &StudentRecord) -> Vec<f64> {
        FEATURE_NAMES
            .iter()
            .map(|&name| {
                if is_categorical(name) {
                    match record.categorical_value(name) {
                        Some(value) => self.encoders.encode(name, value) as f64,
                        None => DEFAULT_FEATURE_VALUE,
                    }
                } else {
                    record.numeric_value(name).unwrap_or(DEFAULT_FEATURE_VALUE)
                }
            })
            .collect()
    }

    /// The globally most important features of the trained model, in
    /// descending order. Global, not per-record: the same explanation
    /// accompanies every prediction from one artifact.
    fn top_factors(&self) -> Vec<TopFactor> {
        let Some(importances) = self.artifact.forest.feature_importances() else {
            return Vec::new();
        };

        let mut ranked: Vec<TopFactor> = FEATURE_NAMES
            .iter()
            .zip(importances.iter())
            .map(|(name, &importance)| TopFactor {
                feature: name.to_string(),
                importance,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(TOP_FACTOR_COUNT);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::StudentGenerator;
    use crate::training::{TrainConfig, Trainer};
    use serde_json::json;

    fn engine() -> InferenceEngine {
        let df = StudentGenerator::new(42).generate(300).unwrap();
        let config = TrainConfig {
            n_estimators: 20,
            cv_folds: 3,
            ..TrainConfig::default()
        };
        let output = Trainer::new(config).train(&df).unwrap();
        InferenceEngine::new(output.artifact, output.encoders)
    }

    #[test]
    fn test_prediction_shape() {
        let record = StudentRecord::from_json(json!({
            "age": 16, "sex": "F", "studyTime": 3, "pastFailures": 0
        }))
        .unwrap();
        let result = engine().predict(&record).unwrap();

        assert!(result.prediction == 0 || result.prediction == 1);
        assert!((result.probability.fail + result.probability.pass - 1.0).abs() < 1e-9);
        assert!(result.confidence >= 0.5);
        assert_eq!(result.top_factors.len(), 5);
    }

    #[test]
    fn test_prediction_text_matches_label() {
        let record = StudentRecord::default();
        let result = engine().predict(&record).unwrap();
        let expected = if result.prediction == 1 { "Pass" } else { "Fail" };
        assert_eq!(result.prediction_text, expected);
    }

    #[test]
    fn test_empty_record_still_served() {
        let result = engine().predict(&StudentRecord::default()).unwrap();
        assert!((result.probability.fail + result.probability.pass - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unseen_category_still_served() {
        let record = StudentRecord::from_json(json!({"sex": "unknown", "age": 17})).unwrap();
        let result = engine().predict(&record).unwrap();
        assert!(result.confidence <= 1.0);
    }

    #[test]
    fn test_top_factors_sorted_descending() {
        let result = engine().predict(&StudentRecord::default()).unwrap();
        let imps: Vec<f64> = result.top_factors.iter().map(|f| f.importance).collect();
        assert!(imps.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_same_record_same_prediction() {
        let engine = engine();
        let record = StudentRecord::from_json(json!({"studyTime": 4, "motherEdu": 4})).unwrap();
        let a = engine.predict(&record).unwrap();
        let b = engine.predict(&record).unwrap();
        assert_eq!(a.probability.pass, b.probability.pass);
        assert_eq!(a.prediction, b.prediction);
    }
}

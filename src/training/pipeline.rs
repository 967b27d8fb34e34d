//! End-to-end training pipeline
//!
//! Encodes categorical features, splits stratified train/test partitions,
//! fits the forest, and produces the evaluation report plus the
//! persistable model artifact.

use crate::error::{GradecastError, Result};
use crate::preprocessing::EncoderSet;
use crate::schema::{CATEGORICAL_FEATURES, FEATURE_NAMES, TARGET_COLUMN};
use crate::training::metrics::{
    accuracy, class_report, ConfusionCounts, CvSummary, EvalReport, FeatureImportance,
};
use crate::training::random_forest::RandomForest;
use crate::training::split::{stratified_split, StratifiedKFold};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Training hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub cv_folds: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            cv_folds: 5,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(GradecastError::ConfigError(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.n_estimators == 0 {
            return Err(GradecastError::ConfigError(
                "n_estimators must be positive".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(GradecastError::ConfigError(
                "max_depth must be positive".to_string(),
            ));
        }
        if self.cv_folds < 2 {
            return Err(GradecastError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }

    fn build_forest(&self) -> RandomForest {
        RandomForest::new(self.n_estimators)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_seed(self.seed)
    }
}

/// Trained model plus the metadata needed to serve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub forest: RandomForest,
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&json)?;
        if artifact.feature_names.len() != FEATURE_NAMES.len() {
            return Err(GradecastError::DataError(format!(
                "artifact expects {} features, schema has {}",
                artifact.feature_names.len(),
                FEATURE_NAMES.len()
            )));
        }
        Ok(artifact)
    }
}

/// Everything a training run produces.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub artifact: ModelArtifact,
    pub encoders: EncoderSet,
    pub report: EvalReport,
}

/// Orchestrates one training run over a labeled dataset.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train and evaluate on a labeled dataset in the canonical schema.
    pub fn train(&self, df: &DataFrame) -> Result<TrainOutput> {
        self.config.validate()?;

        info!(
            rows = df.height(),
            n_estimators = self.config.n_estimators,
            seed = self.config.seed,
            "starting training run"
        );

        let encoders = EncoderSet::fit(df, &CATEGORICAL_FEATURES)?;
        let encoded = encoders.transform(df)?;

        let x = feature_matrix(&encoded)?;
        let y = target_vector(&encoded)?;

        let (train_idx, test_idx) =
            stratified_split(&y, self.config.test_fraction, self.config.seed)?;
        let x_train = x.select(Axis(0), &train_idx);
        let y_train = select_labels(&y, &train_idx);
        let x_test = x.select(Axis(0), &test_idx);
        let y_test = select_labels(&y, &test_idx);

        let mut forest = self.config.build_forest();
        forest.fit(&x_train, &y_train)?;

        let y_pred = forest.predict(&x_test)?;
        let confusion = ConfusionCounts::from_predictions(&y_test, &y_pred)?;
        let test_accuracy = confusion.accuracy();
        info!(accuracy = test_accuracy, "held-out evaluation complete");

        let cv = self.cross_validate(&x_train, &y_train)?;
        info!(mean = cv.mean, std = cv.std, folds = cv.scores.len(), "cross-validation complete");

        let ranked_importances = rank_importances(&forest)?;

        let report = EvalReport {
            accuracy: test_accuracy,
            confusion,
            classes: class_report(&confusion),
            cv,
            ranked_importances,
        };

        let artifact = ModelArtifact {
            forest,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            trained_at: Utc::now(),
        };

        Ok(TrainOutput { artifact, encoders, report })
    }

    /// K-fold accuracy over the training partition only, so the held-out
    /// test rows never leak into fold fitting.
    fn cross_validate(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<CvSummary> {
        let folds = StratifiedKFold::new(self.config.cv_folds, self.config.seed).split(y)?;

        let mut scores = Vec::with_capacity(folds.len());
        for (train_idx, val_idx) in &folds {
            let x_fold = x.select(Axis(0), train_idx);
            let y_fold = select_labels(y, train_idx);
            let x_val = x.select(Axis(0), val_idx);
            let y_val = select_labels(y, val_idx);

            let mut fold_forest = self.config.build_forest();
            fold_forest.fit(&x_fold, &y_fold)?;
            let y_pred = fold_forest.predict(&x_val)?;
            scores.push(accuracy(&y_val, &y_pred)?);
        }
        Ok(CvSummary::from_scores(scores))
    }
}

/// Assemble the feature matrix in canonical column order, casting every
/// column (raw numeric or label-encoded) to f64.
pub fn feature_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let mut matrix = Array2::zeros((n_rows, FEATURE_NAMES.len()));

    for (col_idx, name) in FEATURE_NAMES.iter().enumerate() {
        let column = df
            .column(name)
            .map_err(|_| GradecastError::FeatureNotFound(name.to_string()))?;
        let casted = column
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| {
                GradecastError::DataError(format!("column {name} is not numeric: {e}"))
            })?;
        let values = casted
            .f64()
            .map_err(|e| GradecastError::DataError(e.to_string()))?;
        for (row_idx, value) in values.into_iter().enumerate() {
            matrix[[row_idx, col_idx]] = value.ok_or_else(|| {
                GradecastError::DataError(format!("null value in column {name} at row {row_idx}"))
            })?;
        }
    }
    Ok(matrix)
}

/// Extract the binary target column as f64 labels.
pub fn target_vector(df: &DataFrame) -> Result<Array1<f64>> {
    let column = df
        .column(TARGET_COLUMN)
        .map_err(|_| GradecastError::FeatureNotFound(TARGET_COLUMN.to_string()))?;
    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| GradecastError::DataError(e.to_string()))?;
    let values = casted
        .f64()
        .map_err(|e| GradecastError::DataError(e.to_string()))?;

    let mut labels = Vec::with_capacity(df.height());
    for (row_idx, value) in values.into_iter().enumerate() {
        let v = value.ok_or_else(|| {
            GradecastError::DataError(format!("null label at row {row_idx}"))
        })?;
        if v != 0.0 && v != 1.0 {
            return Err(GradecastError::DataError(format!(
                "label at row {row_idx} is {v}, expected 0 or 1"
            )));
        }
        labels.push(v);
    }
    Ok(Array1::from_vec(labels))
}

fn select_labels(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    Array1::from_vec(indices.iter().map(|&i| y[i]).collect())
}

fn rank_importances(forest: &RandomForest) -> Result<Vec<FeatureImportance>> {
    let importances = forest
        .feature_importances()
        .ok_or(GradecastError::ModelNotFitted)?;

    let mut ranked: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .zip(importances.iter())
        .map(|(name, &importance)| FeatureImportance {
            feature: name.to_string(),
            importance,
        })
        .collect();
    // Stable sort keeps schema order among ties
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(ranked)
}

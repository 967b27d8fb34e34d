//! Evaluation metrics for the binary outcome model

use crate::error::{GradecastError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Binary confusion counts; class 1 ("Pass") is the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(GradecastError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        let mut counts = Self::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred.iter()) {
            match (truth == 1.0, pred == 1.0) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fn_ += 1,
            }
        }
        Ok(counts)
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.tp + self.tn) as f64 / total as f64
    }
}

/// Per-class precision, recall and F1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(label: &str, tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = safe_ratio(tp, tp + fp);
        let recall = safe_ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            label: label.to_string(),
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

fn safe_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Per-class report for both outcome labels.
pub fn class_report(counts: &ConfusionCounts) -> Vec<ClassMetrics> {
    vec![
        // For "Fail", the negatives of the positive class swap roles
        ClassMetrics::from_counts("Fail", counts.tn, counts.fn_, counts.fp),
        ClassMetrics::from_counts("Pass", counts.tp, counts.fp, counts.fn_),
    ]
}

/// Mean and dispersion of per-fold cross-validation scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvSummary {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CvSummary {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / n
        };
        let std = if scores.len() < 2 {
            0.0
        } else {
            let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
            var.sqrt()
        };
        Self { scores, mean, std }
    }

    /// The `mean ± 2·std` band conventionally reported for CV accuracy.
    pub fn dispersion_band(&self) -> (f64, f64) {
        (self.mean - 2.0 * self.std, self.mean + 2.0 * self.std)
    }
}

/// One feature's share of the model's total impurity reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Full evaluation output of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub accuracy: f64,
    pub confusion: ConfusionCounts,
    pub classes: Vec<ClassMetrics>,
    pub cv: CvSummary,
    /// Importances sorted descending; ties keep schema order.
    pub ranked_importances: Vec<FeatureImportance>,
}

/// Fraction of exact prediction matches.
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    Ok(ConfusionCounts::from_predictions(y_true, y_pred)?.accuracy())
}

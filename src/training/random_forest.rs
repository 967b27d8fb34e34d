//! Bagged ensemble of binary classification trees

use crate::error::{GradecastError, Result};
use super::decision_tree::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest binary classifier.
///
/// Trees are trained on bootstrap samples with sqrt-of-features random
/// subsets per split. Tree seeds derive from the base seed by index, so
/// the fit is reproducible regardless of how rayon schedules the work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the ensemble on binary-labeled data.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(GradecastError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.n_estimators == 0 {
            return Err(GradecastError::ConfigError(
                "ensemble size must be positive".to_string(),
            ));
        }

        self.n_features = n_features;
        let max_features = ((n_features as f64).sqrt().ceil() as usize).max(1);

        let trees: Result<Vec<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit(&x_boot, &y_boot, &mut rng)?;
                Ok(tree)
            })
            .collect();
        self.trees = trees?;

        self.compute_feature_importances();
        Ok(())
    }

    fn compute_feature_importances(&mut self) {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (slot, &val) in totals.iter_mut().zip(imp.iter()) {
                    *slot += val;
                }
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for val in &mut totals {
                *val /= sum;
            }
        }
        self.feature_importances = Some(Array1::from_vec(totals));
    }

    /// Class probabilities as the fraction of tree votes, `(n, 2)` with
    /// column 0 = class 0 and column 1 = class 1.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(GradecastError::ModelNotFitted);
        }

        let votes: Result<Vec<Array1<f64>>> =
            self.trees.par_iter().map(|tree| tree.predict(x)).collect();
        let votes = votes?;

        let n_samples = x.nrows();
        let n_trees = votes.len() as f64;
        let mut proba = Array2::zeros((n_samples, 2));
        for i in 0..n_samples {
            let positive: f64 = votes.iter().map(|v| v[i]).sum();
            proba[[i, 1]] = positive / n_trees;
            proba[[i, 0]] = 1.0 - proba[[i, 1]];
        }
        Ok(proba)
    }

    /// Majority-vote class labels; a tie resolves to class 0.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        let labels: Vec<f64> = proba
            .rows()
            .into_iter()
            .map(|row| if row[1] > row[0] { 1.0 } else { 0.0 })
            .collect();
        Ok(Array1::from_vec(labels))
    }

    /// Global impurity-based importances, normalized to sum to 1.0.
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.2],
            [0.1, 0.1],
            [0.2, 0.3],
            [0.3, 0.0],
            [1.0, 1.2],
            [1.1, 1.1],
            [1.2, 1.3],
            [1.3, 1.0],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_fit_predict() {
        let (x, y) = toy_data();
        let mut forest = RandomForest::new(25).with_seed(42);
        forest.fit(&x, &y).unwrap();

        assert_eq!(forest.n_trees(), 25);
        let predictions = forest.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        assert!(correct >= 7, "only {correct}/8 correct");
    }

    #[test]
    fn test_proba_rows_sum_to_one() {
        let (x, y) = toy_data();
        let mut forest = RandomForest::new(10).with_seed(1);
        forest.fit(&x, &y).unwrap();

        let proba = forest.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic_under_seed() {
        let (x, y) = toy_data();
        let mut a = RandomForest::new(15).with_seed(7);
        let mut b = RandomForest::new(15).with_seed(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let pa = a.predict_proba(&x).unwrap();
        let pb = b.predict_proba(&x).unwrap();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = toy_data();
        let mut forest = RandomForest::new(20).with_seed(3);
        forest.fit(&x, &y).unwrap();

        let importances = forest.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!((importances.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unfitted_predict_fails() {
        let forest = RandomForest::new(5);
        let err = forest.predict(&array![[0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, GradecastError::ModelNotFitted));
    }
}

//! Binary classification tree with Gini impurity

use crate::error::{GradecastError, Result};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node carrying the majority class
    Leaf { class: f64, n_samples: usize },
    /// Internal node with a threshold split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Binary classification tree.
///
/// Labels must be 0.0 or 1.0. Split candidates are scanned over a random
/// subset of features when `max_features` is set, which is what gives the
/// ensemble its de-correlation; the caller supplies the RNG so the whole
/// tree is a pure function of its inputs and the stream state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
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

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Fit the tree to training data.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, rng: &mut ChaCha8Rng) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(GradecastError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(GradecastError::TrainingError(
                "cannot fit a tree on an empty dataset".to_string(),
            ));
        }
        if y.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(GradecastError::TrainingError(
                "labels must be binary (0 or 1)".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_node(x, y, &indices, 0, &mut importances, rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(())
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let positives = indices.iter().filter(|&&i| y[i] == 1.0).count();

        let pure = positives == 0 || positives == n_samples;
        let should_stop = pure
            || n_samples < self.min_samples_split
            || self.max_depth.is_some_and(|d| depth >= d);

        if should_stop {
            return Self::leaf(positives, n_samples);
        }

        let Some((feature_idx, threshold, gain)) = self.find_best_split(x, y, indices, rng) else {
            return Self::leaf(positives, n_samples);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf
        {
            return Self::leaf(positives, n_samples);
        }

        // Impurity-reduction importance, weighted by node size
        importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_node(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_node(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        }
    }

    fn leaf(positives: usize, n_samples: usize) -> TreeNode {
        // Ties resolve to class 0 so leaf values are deterministic
        let class = if 2 * positives > n_samples { 1.0 } else { 0.0 };
        TreeNode::Leaf { class, n_samples }
    }

    /// Scan a (possibly random) feature subset for the threshold with the
    /// largest Gini gain. Returns `(feature, threshold, gain)`.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len();
        let total_pos = indices.iter().filter(|&&i| y[i] == 1.0).count();
        let parent_impurity = gini(total_pos, n);

        let mut candidates: Vec<usize> = (0..self.n_features).collect();
        if let Some(m) = self.max_features {
            if m < self.n_features {
                candidates.shuffle(rng);
                candidates.truncate(m);
            }
        }

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in &candidates {
            // Sorted scan with running counts: each boundary between two
            // distinct values is a candidate threshold.
            let mut order: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (x[[i, feature_idx]], y[i]))
                .collect();
            order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_count = 0usize;
            let mut left_pos = 0usize;

            for i in 0..n - 1 {
                left_count += 1;
                if order[i].1 == 1.0 {
                    left_pos += 1;
                }

                if order[i + 1].0 <= order[i].0 {
                    continue;
                }

                let right_count = n - left_count;
                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }

                let right_pos = total_pos - left_pos;
                let weighted = (left_count as f64 * gini(left_pos, left_count)
                    + right_count as f64 * gini(right_pos, right_count))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                    let threshold = (order[i].0 + order[i + 1].0) / 2.0;
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best
    }

    /// Predict the class for a batch of samples.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(GradecastError::ModelNotFitted)?;
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let sample = x.row(i).to_vec();
                Self::predict_node(root, &sample)
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    fn predict_node(node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { class, .. } => *class,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_node(left, sample)
                } else {
                    Self::predict_node(right, sample)
                }
            }
        }
    }

    /// Normalized impurity-reduction importances, once fitted.
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Depth of the fitted tree (0 when unfitted).
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

/// Gini impurity for a binary node: `2 p (1 - p)`.
fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

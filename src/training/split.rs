//! Stratified partitioning for train/test splits and cross-validation

use crate::error::{GradecastError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Split row indices into train and test partitions, preserving the
/// class ratio of `y` in both. Returns `(train_indices, test_indices)`.
///
/// Classes are walked in sorted label order and a single seeded RNG
/// shuffles each class's members, so the split is a pure function of
/// `(y, test_fraction, seed)`.
pub fn stratified_split(
    y: &Array1<f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(GradecastError::ConfigError(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        by_class.entry(label as i64).or_default().push(i);
    }

    for (label, members) in &by_class {
        if members.len() < 2 {
            return Err(GradecastError::ConfigError(format!(
                "class {label} has only {} sample(s); need at least 2 per class to split",
                members.len()
            )));
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for members in by_class.values() {
        let mut members = members.clone();
        members.shuffle(&mut rng);

        // Both sides keep at least one member of every class
        let n_test = ((members.len() as f64 * test_fraction).round() as usize)
            .clamp(1, members.len() - 1);

        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Stratified k-fold index generator for cross-validation.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Produce `(train, validation)` index pairs, one per fold. Each
    /// class is shuffled once and dealt round-robin across folds, so
    /// every fold's class ratio tracks the full set.
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 {
            return Err(GradecastError::ConfigError(format!(
                "cross-validation needs at least 2 folds, got {}",
                self.n_splits
            )));
        }

        let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            by_class.entry(label as i64).or_default().push(i);
        }

        for (label, members) in &by_class {
            if members.len() < self.n_splits {
                return Err(GradecastError::ConfigError(format!(
                    "class {label} has {} sample(s), fewer than {} folds",
                    members.len(),
                    self.n_splits
                )));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut fold_members: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];

        for members in by_class.values() {
            let mut members = members.clone();
            members.shuffle(&mut rng);
            for (pos, idx) in members.into_iter().enumerate() {
                fold_members[pos % self.n_splits].push(idx);
            }
        }

        let mut folds = Vec::with_capacity(self.n_splits);
        for held_out in 0..self.n_splits {
            let mut validation = fold_members[held_out].clone();
            validation.sort_unstable();

            let mut train: Vec<usize> = fold_members
                .iter()
                .enumerate()
                .filter(|(f, _)| *f != held_out)
                .flat_map(|(_, m)| m.iter().copied())
                .collect();
            train.sort_unstable();

            folds.push((train, validation));
        }
        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(zeros: usize, ones: usize) -> Array1<f64> {
        let mut v = vec![0.0; zeros];
        v.extend(std::iter::repeat(1.0).take(ones));
        Array1::from_vec(v)
    }

    #[test]
    fn test_split_is_a_partition() {
        let y = labels(30, 20);
        let (train, test) = stratified_split(&y, 0.2, 42).unwrap();

        assert_eq!(train.len() + test.len(), 50);
        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 50);
    }

    #[test]
    fn test_split_preserves_class_ratio() {
        let y = labels(60, 40);
        let (_, test) = stratified_split(&y, 0.2, 42).unwrap();

        assert_eq!(test.len(), 20);
        let test_ones = test.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(test_ones, 8);
    }

    #[test]
    fn test_split_deterministic() {
        let y = labels(25, 25);
        let a = stratified_split(&y, 0.3, 7).unwrap();
        let b = stratified_split(&y, 0.3, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let y = labels(5, 5);
        assert!(stratified_split(&y, 0.0, 42).is_err());
        assert!(stratified_split(&y, 1.0, 42).is_err());
        assert!(stratified_split(&y, 1.5, 42).is_err());
    }

    #[test]
    fn test_split_rejects_singleton_class() {
        let y = labels(9, 1);
        let err = stratified_split(&y, 0.2, 42).unwrap_err();
        assert!(matches!(err, GradecastError::ConfigError(_)));
    }

    #[test]
    fn test_split_small_class_keeps_both_sides() {
        // round(2 * 0.2) = 0 would empty the test side without the clamp
        let y = labels(10, 2);
        let (train, test) = stratified_split(&y, 0.2, 42).unwrap();
        assert!(test.iter().any(|&i| y[i] == 1.0));
        assert!(train.iter().any(|&i| y[i] == 1.0));
    }

    #[test]
    fn test_kfold_covers_every_index_once() {
        let y = labels(40, 35);
        let folds = StratifiedKFold::new(5, 42).split(&y).unwrap();
        assert_eq!(folds.len(), 5);

        let mut validation_union: Vec<usize> = folds
            .iter()
            .flat_map(|(_, v)| v.iter().copied())
            .collect();
        validation_union.sort_unstable();
        assert_eq!(validation_union, (0..75).collect::<Vec<_>>());

        for (train, validation) in &folds {
            assert_eq!(train.len() + validation.len(), 75);
            assert!(validation.iter().all(|i| !train.contains(i)));
        }
    }

    #[test]
    fn test_kfold_each_fold_has_both_classes() {
        let y = labels(20, 15);
        let folds = StratifiedKFold::new(5, 42).split(&y).unwrap();
        for (_, validation) in &folds {
            assert!(validation.iter().any(|&i| y[i] == 0.0));
            assert!(validation.iter().any(|&i| y[i] == 1.0));
        }
    }

    #[test]
    fn test_kfold_rejects_scarce_class() {
        let y = labels(20, 3);
        let err = StratifiedKFold::new(5, 42).split(&y).unwrap_err();
        assert!(matches!(err, GradecastError::ConfigError(_)));
    }
}

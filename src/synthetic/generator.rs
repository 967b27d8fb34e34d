//! Student record generator

use crate::error::{GradecastError, Result};
use crate::schema::TARGET_COLUMN;
use polars::prelude::*;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Normal, Poisson};

// Per-feature probability tables. The literal values, like the sampling
// order below, are part of the reproducibility contract.
const AGES: [i64; 5] = [15, 16, 17, 18, 19];
const AGE_WEIGHTS: [f64; 5] = [0.1, 0.25, 0.3, 0.25, 0.1];

const SEXES: [&str; 2] = ["M", "F"];
const SEX_WEIGHTS: [f64; 2] = [0.52, 0.48];

const ADDRESSES: [&str; 2] = ["U", "R"];
const ADDRESS_WEIGHTS: [f64; 2] = [0.7, 0.3];

const FAMSIZES: [&str; 2] = ["LE3", "GT3"];
const FAMSIZE_WEIGHTS: [f64; 2] = [0.3, 0.7];

const PARENT_STATUSES: [&str; 2] = ["T", "A"];
const PARENT_STATUS_WEIGHTS: [f64; 2] = [0.85, 0.15];

const EDU_LEVELS: [i64; 5] = [0, 1, 2, 3, 4];
const MOTHER_EDU_WEIGHTS: [f64; 5] = [0.1, 0.15, 0.25, 0.3, 0.2];
const FATHER_EDU_WEIGHTS: [f64; 5] = [0.12, 0.18, 0.25, 0.28, 0.17];

const STUDY_TIMES: [i64; 4] = [1, 2, 3, 4];
const STUDY_TIME_WEIGHTS: [f64; 4] = [0.2, 0.4, 0.25, 0.15];

const FAILURES: [i64; 4] = [0, 1, 2, 3];
const FAILURE_WEIGHTS: [f64; 4] = [0.6, 0.25, 0.1, 0.05];

const YES_NO: [&str; 2] = ["yes", "no"];
const SCHOOL_SUPPORT_WEIGHTS: [f64; 2] = [0.3, 0.7];
const FAMILY_SUPPORT_WEIGHTS: [f64; 2] = [0.7, 0.3];
const PAID_CLASSES_WEIGHTS: [f64; 2] = [0.4, 0.6];
const ACTIVITIES_WEIGHTS: [f64; 2] = [0.5, 0.5];
const INTERNET_WEIGHTS: [f64; 2] = [0.8, 0.2];
const ROMANTIC_WEIGHTS: [f64; 2] = [0.35, 0.65];

const SCALE_1_TO_5: [i64; 5] = [1, 2, 3, 4, 5];
const FAMILY_QUALITY_WEIGHTS: [f64; 5] = [0.05, 0.1, 0.2, 0.4, 0.25];
const FREE_TIME_WEIGHTS: [f64; 5] = [0.1, 0.2, 0.4, 0.2, 0.1];
const GO_OUT_WEIGHTS: [f64; 5] = [0.15, 0.25, 0.35, 0.15, 0.1];
const HEALTH_WEIGHTS: [f64; 5] = [0.05, 0.1, 0.25, 0.35, 0.25];

const ABSENCES_MEAN: f64 = 5.0;

/// Reproducible synthetic dataset generator.
///
/// All randomness flows from a single seeded ChaCha8 stream, so two calls
/// with the same count and seed produce byte-identical datasets. Features
/// are sampled column-wise in canonical order, then the noise column, so
/// the draw order is part of the reproducibility contract.
#[derive(Debug, Clone)]
pub struct StudentGenerator {
    seed: u64,
}

impl StudentGenerator {
    /// Create a generator with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generate `count` labeled student records.
    pub fn generate(&self, count: usize) -> Result<DataFrame> {
        if count == 0 {
            return Err(GradecastError::ConfigError(
                "record count must be a positive integer".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let ages = sample_weighted(&mut rng, &AGES, &AGE_WEIGHTS, count)?;
        let sexes = sample_weighted(&mut rng, &SEXES, &SEX_WEIGHTS, count)?;
        let addresses = sample_weighted(&mut rng, &ADDRESSES, &ADDRESS_WEIGHTS, count)?;
        let famsizes = sample_weighted(&mut rng, &FAMSIZES, &FAMSIZE_WEIGHTS, count)?;
        let parent_statuses =
            sample_weighted(&mut rng, &PARENT_STATUSES, &PARENT_STATUS_WEIGHTS, count)?;
        let mother_edu = sample_weighted(&mut rng, &EDU_LEVELS, &MOTHER_EDU_WEIGHTS, count)?;
        let father_edu = sample_weighted(&mut rng, &EDU_LEVELS, &FATHER_EDU_WEIGHTS, count)?;
        let study_times = sample_weighted(&mut rng, &STUDY_TIMES, &STUDY_TIME_WEIGHTS, count)?;
        let failures = sample_weighted(&mut rng, &FAILURES, &FAILURE_WEIGHTS, count)?;
        let school_support = sample_weighted(&mut rng, &YES_NO, &SCHOOL_SUPPORT_WEIGHTS, count)?;
        let family_support = sample_weighted(&mut rng, &YES_NO, &FAMILY_SUPPORT_WEIGHTS, count)?;
        let paid_classes = sample_weighted(&mut rng, &YES_NO, &PAID_CLASSES_WEIGHTS, count)?;
        let activities = sample_weighted(&mut rng, &YES_NO, &ACTIVITIES_WEIGHTS, count)?;
        let internet = sample_weighted(&mut rng, &YES_NO, &INTERNET_WEIGHTS, count)?;
        let romantic = sample_weighted(&mut rng, &YES_NO, &ROMANTIC_WEIGHTS, count)?;
        let family_quality =
            sample_weighted(&mut rng, &SCALE_1_TO_5, &FAMILY_QUALITY_WEIGHTS, count)?;
        let free_time = sample_weighted(&mut rng, &SCALE_1_TO_5, &FREE_TIME_WEIGHTS, count)?;
        let go_out = sample_weighted(&mut rng, &SCALE_1_TO_5, &GO_OUT_WEIGHTS, count)?;
        let health = sample_weighted(&mut rng, &SCALE_1_TO_5, &HEALTH_WEIGHTS, count)?;

        let poisson = Poisson::new(ABSENCES_MEAN)
            .map_err(|e| GradecastError::ConfigError(e.to_string()))?;
        let absences: Vec<i64> = (0..count)
            .map(|_| poisson.sample(&mut rng) as i64)
            .collect();

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| GradecastError::ConfigError(e.to_string()))?;
        let noise: Vec<f64> = (0..count).map(|_| normal.sample(&mut rng)).collect();

        // Performance score: weighted linear combination plus noise. The
        // summation order matters for bit-exact reproducibility.
        let scores: Vec<f64> = (0..count)
            .map(|i| {
                (5.0 - ages[i] as f64 + 15.0) * 0.1
                    + (mother_edu[i] + father_edu[i]) as f64 * 0.15
                    + study_times[i] as f64 * 0.25
                    + (4.0 - failures[i] as f64) * 0.2
                    + yes(school_support[i]) * 0.05
                    + yes(family_support[i]) * 0.1
                    + yes(internet[i]) * 0.05
                    + family_quality[i] as f64 * 0.05
                    + health[i] as f64 * 0.03
                    + noise[i] * 0.1
            })
            .collect();

        // Label 1 iff strictly above the batch median; ties resolve to 0.
        // The median is computed over this batch, so labels are
        // dataset-relative by design.
        let threshold = median(&scores);
        let outcomes: Vec<i64> = scores
            .iter()
            .map(|&s| if s > threshold { 1 } else { 0 })
            .collect();

        let df = DataFrame::new(vec![
            Series::new("age".into(), ages).into(),
            Series::new("sex".into(), sexes).into(),
            Series::new("address".into(), addresses).into(),
            Series::new("famsize".into(), famsizes).into(),
            Series::new("parentStatus".into(), parent_statuses).into(),
            Series::new("motherEdu".into(), mother_edu).into(),
            Series::new("fatherEdu".into(), father_edu).into(),
            Series::new("studyTime".into(), study_times).into(),
            Series::new("pastFailures".into(), failures).into(),
            Series::new("schoolSupport".into(), school_support).into(),
            Series::new("familySupport".into(), family_support).into(),
            Series::new("paidClasses".into(), paid_classes).into(),
            Series::new("activities".into(), activities).into(),
            Series::new("internetAccess".into(), internet).into(),
            Series::new("romantic".into(), romantic).into(),
            Series::new("familyQuality".into(), family_quality).into(),
            Series::new("freeTime".into(), free_time).into(),
            Series::new("goOut".into(), go_out).into(),
            Series::new("health".into(), health).into(),
            Series::new("absences".into(), absences).into(),
            Series::new(TARGET_COLUMN.into(), outcomes).into(),
        ])?;

        Ok(df)
    }
}

fn sample_weighted<T: Copy>(
    rng: &mut ChaCha8Rng,
    choices: &[T],
    weights: &[f64],
    count: usize,
) -> Result<Vec<T>> {
    let dist = WeightedIndex::new(weights)
        .map_err(|e| GradecastError::ConfigError(format!("invalid probability table: {e}")))?;
    Ok((0..count).map(|_| choices[dist.sample(rng)]).collect())
}

fn yes(value: &str) -> f64 {
    if value == "yes" {
        1.0
    } else {
        0.0
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CATEGORICAL_FEATURES, FEATURE_NAMES};

    #[test]
    fn test_zero_count_rejected() {
        let err = StudentGenerator::new(42).generate(0).unwrap_err();
        assert!(matches!(err, GradecastError::ConfigError(_)));
    }

    #[test]
    fn test_column_order_matches_schema() {
        let df = StudentGenerator::new(42).generate(10).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let mut expected: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        expected.push(TARGET_COLUMN.to_string());
        assert_eq!(names, expected);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let a = StudentGenerator::new(7).generate(200).unwrap();
        let b = StudentGenerator::new(7).generate(200).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = StudentGenerator::new(1).generate(200).unwrap();
        let b = StudentGenerator::new(2).generate(200).unwrap();
        assert!(!a.equals(&b));
    }

    #[test]
    fn test_median_split_balances_labels() {
        for seed in [3u64, 11, 42] {
            let df = StudentGenerator::new(seed).generate(501).unwrap();
            let ones: i64 = df
                .column(TARGET_COLUMN)
                .unwrap()
                .i64()
                .unwrap()
                .into_no_null_iter()
                .sum();
            let zeros = 501 - ones;
            assert!((ones - zeros).abs() <= 1, "seed {seed}: {ones} vs {zeros}");
        }
    }

    #[test]
    fn test_categorical_values_within_domains() {
        let df = StudentGenerator::new(42).generate(300).unwrap();
        let info = crate::schema::feature_info();
        for col in CATEGORICAL_FEATURES {
            let allowed = &info.categorical_features[col];
            let series = df.column(col).unwrap().str().unwrap();
            for v in series.into_no_null_iter() {
                assert!(allowed.contains(&v), "{col} produced {v}");
            }
        }
    }

    #[test]
    fn test_numeric_ranges() {
        let df = StudentGenerator::new(9).generate(300).unwrap();
        let ages = df.column("age").unwrap().i64().unwrap();
        assert!(ages.into_no_null_iter().all(|a| (15..=19).contains(&a)));
        let absences = df.column("absences").unwrap().i64().unwrap();
        assert!(absences.into_no_null_iter().all(|a| a >= 0));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[1.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[5.0, 1.0, 3.0, 4.0]), 3.5);
    }
}

//! Ordinal category encoders with an unseen-value fallback

use crate::error::{GradecastError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Code assigned to values that were never seen during fitting.
///
/// Serving a prediction must not fail over one miscoded feature, so
/// out-of-vocabulary values are absorbed into code 0 instead of being
/// reported as errors. Changing this constant would silently shift
/// predictions for unseen inputs.
pub const FALLBACK_CODE: usize = 0;

/// Injective mapping from observed category values to consecutive codes.
///
/// Codes are assigned in first-seen order, which makes fitting
/// deterministic for a given input sequence. The mapping is immutable
/// after fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEncoder {
    mapping: HashMap<String, usize>,
}

impl CategoryEncoder {
    /// Fit an encoder over a sequence of category values.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut mapping = HashMap::new();
        for value in values {
            if !mapping.contains_key(value) {
                let code = mapping.len();
                mapping.insert(value.to_string(), code);
            }
        }
        Self { mapping }
    }

    /// Encode a value, falling back to [`FALLBACK_CODE`] when it is
    /// outside the fitted vocabulary. Never fails.
    pub fn encode(&self, value: &str) -> usize {
        self.mapping.get(value).copied().unwrap_or(FALLBACK_CODE)
    }

    /// Whether a value is part of the fitted vocabulary.
    pub fn contains(&self, value: &str) -> bool {
        self.mapping.contains_key(value)
    }

    /// Number of distinct fitted values.
    pub fn vocabulary_size(&self) -> usize {
        self.mapping.len()
    }
}

/// All fitted encoders for a dataset, keyed by feature name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderSet {
    encoders: HashMap<String, CategoryEncoder>,
}

impl EncoderSet {
    /// Fit one encoder per named column over the full dataset.
    pub fn fit(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let mut encoders = HashMap::new();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| GradecastError::FeatureNotFound(col_name.to_string()))?;
            let ca = column
                .as_materialized_series()
                .str()
                .map_err(|e| GradecastError::DataError(e.to_string()))?;
            let encoder = CategoryEncoder::fit(ca.into_iter().flatten());
            encoders.insert(col_name.to_string(), encoder);
        }
        Ok(Self { encoders })
    }

    /// Label-encode every fitted column present in the frame, in place.
    /// Values outside a column's vocabulary take the fallback code.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (col_name, encoder) in &self.encoders {
            if let Ok(column) = df.column(col_name) {
                let ca = column
                    .as_materialized_series()
                    .str()
                    .map_err(|e| GradecastError::DataError(e.to_string()))?;
                let values: Vec<i64> = ca
                    .into_iter()
                    .map(|v| v.map_or(FALLBACK_CODE, |s| encoder.encode(s)) as i64)
                    .collect();
                let encoded = Series::new(col_name.as_str().into(), values);
                result.with_column(encoded)?;
            }
        }
        Ok(result)
    }

    /// Encode a single value for a named feature. A feature without a
    /// fitted encoder also takes the fallback code.
    pub fn encode(&self, feature: &str, value: &str) -> usize {
        self.encoders
            .get(feature)
            .map_or(FALLBACK_CODE, |e| e.encode(value))
    }

    /// Get the encoder for a feature, if one was fitted.
    pub fn get(&self, feature: &str) -> Option<&CategoryEncoder> {
        self.encoders.get(feature)
    }

    /// Number of fitted encoders.
    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    /// Whether no encoders were fitted.
    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Persist the encoder set as a JSON artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an encoder set from a JSON artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let set: Self = serde_json::from_str(&json)?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let encoder = CategoryEncoder::fit(["b", "a", "b", "c", "a"]);
        assert_eq!(encoder.encode("b"), 0);
        assert_eq!(encoder.encode("a"), 1);
        assert_eq!(encoder.encode("c"), 2);
    }

    #[test]
    fn test_injective_over_vocabulary() {
        let values = ["yes", "no", "maybe"];
        let encoder = CategoryEncoder::fit(values);
        let mut codes: Vec<usize> = values.iter().map(|v| encoder.encode(v)).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), values.len());
    }

    #[test]
    fn test_stable_across_refits() {
        let values = ["U", "R", "U", "U", "R"];
        let a = CategoryEncoder::fit(values);
        let b = CategoryEncoder::fit(values);
        for v in values {
            assert_eq!(a.encode(v), b.encode(v));
        }
    }

    #[test]
    fn test_unseen_value_falls_back() {
        let encoder = CategoryEncoder::fit(["M", "F"]);
        assert_eq!(encoder.encode("X"), FALLBACK_CODE);
        assert!(!encoder.contains("X"));
    }

    #[test]
    fn test_set_fit_and_transform() {
        let df = df!(
            "sex" => &["M", "F", "M"],
            "address" => &["U", "U", "R"],
            "age" => &[16i64, 17, 18]
        )
        .unwrap();

        let set = EncoderSet::fit(&df, &["sex", "address"]).unwrap();
        assert_eq!(set.len(), 2);

        let encoded = set.transform(&df).unwrap();
        let sex = encoded.column("sex").unwrap().i64().unwrap();
        assert_eq!(sex.get(0), Some(0)); // M first seen
        assert_eq!(sex.get(1), Some(1));
        // Untouched numeric column survives
        assert!(encoded.column("age").unwrap().i64().is_ok());
    }

    #[test]
    fn test_set_missing_column_is_error() {
        let df = df!("sex" => &["M", "F"]).unwrap();
        let err = EncoderSet::fit(&df, &["sex", "nope"]).unwrap_err();
        assert!(matches!(err, GradecastError::FeatureNotFound(_)));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let df = df!("sex" => &["M", "F", "F"]).unwrap();
        let set = EncoderSet::fit(&df, &["sex"]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoders.json");
        set.save(&path).unwrap();
        let loaded = EncoderSet::load(&path).unwrap();

        assert_eq!(loaded.encode("sex", "M"), set.encode("sex", "M"));
        assert_eq!(loaded.encode("sex", "F"), set.encode("sex", "F"));
        assert_eq!(loaded.encode("sex", "unknown"), FALLBACK_CODE);
    }
}

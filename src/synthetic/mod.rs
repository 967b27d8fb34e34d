//! Synthetic student dataset generation
//!
//! The generator is the de facto ground truth for this system: no external
//! dataset is consulted. Records are drawn from fixed per-feature
//! probability tables, scored with a linear-plus-noise function, and
//! binarized around the batch median.

mod generator;

pub use generator::StudentGenerator;

use crate::error::Result;
use polars::prelude::*;
use std::path::Path;

/// Write a generated dataset to a flat CSV snapshot.
pub fn write_snapshot(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

//! Gradecast - Student academic outcome prediction
//!
//! This crate provides the full pipeline behind a binary pass/fail
//! predictor for student records:
//! - Synthetic labeled dataset generation from fixed probability tables
//! - Categorical feature encoding with an unseen-value fallback
//! - Random forest training with stratified splits and cross-validation
//! - A serving engine producing probabilities and feature explanations
//!
//! # Modules
//!
//! - [`schema`] - Fixed 20-feature student record schema
//! - [`synthetic`] - Seeded dataset generation
//! - [`preprocessing`] - Category encoders
//! - [`training`] - Forest training, splitting, evaluation
//! - [`inference`] - Single-record prediction serving
//! - [`cli`] - Command-line interface

pub mod error;
pub mod schema;

pub mod synthetic;
pub mod preprocessing;
pub mod training;
pub mod inference;

pub mod cli;

pub use error::{GradecastError, Result};

/// Commonly used types, for `use gradecast::prelude::*`.
pub mod prelude {
    pub use crate::error::{GradecastError, Result};
    pub use crate::inference::{InferenceEngine, PredictionResult};
    pub use crate::preprocessing::{CategoryEncoder, EncoderSet};
    pub use crate::schema::{StudentRecord, FEATURE_NAMES, TARGET_COLUMN};
    pub use crate::synthetic::StudentGenerator;
    pub use crate::training::{RandomForest, TrainConfig, Trainer};
}

//! Prediction serving
//!
//! Wraps a trained artifact and its fitted encoders behind a cheap,
//! shareable engine that turns partial JSON records into predictions
//! with per-class probabilities and an importance-based explanation.

mod engine;

pub use engine::{InferenceEngine, OutcomeProbability, PredictionResult, TopFactor};

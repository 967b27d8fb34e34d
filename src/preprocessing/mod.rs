//! Categorical feature encoding
//!
//! One encoder per categorical feature, fitted once by the training
//! pipeline and shared read-only with the inference engine afterwards.

mod encoder;

pub use encoder::{CategoryEncoder, EncoderSet, FALLBACK_CODE};

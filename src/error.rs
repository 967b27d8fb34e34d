//! Error types for the gradecast pipeline

use thiserror::Error;

/// Result type alias for gradecast operations
pub type Result<T> = std::result::Result<T, GradecastError>;

/// Main error type for the gradecast pipeline
#[derive(Error, Debug)]
pub enum GradecastError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for GradecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        GradecastError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for GradecastError {
    fn from(err: serde_json::Error) -> Self {
        GradecastError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for GradecastError {
    fn from(err: ndarray::ShapeError) -> Self {
        GradecastError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GradecastError::ConfigError("count must be positive".to_string());
        assert_eq!(err.to_string(), "Configuration error: count must be positive");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GradecastError = io_err.into();
        assert!(matches!(err, GradecastError::IoError(_)));
    }
}

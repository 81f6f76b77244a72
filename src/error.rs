//! Error types for the occupational stress pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, StressError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum StressError {
    /// Source table unreadable or required columns absent
    #[error("Data load error: {0}")]
    DataLoad(String),

    /// A persisted artifact was expected but does not exist
    #[error("Model file missing: {}", path.display())]
    ModelFileMissing { path: PathBuf },

    /// No classifier is available and none could be loaded or trained
    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Feature vector malformed or incompatible with the fitted model
    #[error("Prediction input error: {0}")]
    PredictionInput(String),

    #[error("Preprocessing error: {0}")]
    Preprocessing(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl StressError {
    /// Stable snake-case tag used in structured error reports
    pub fn kind(&self) -> &'static str {
        match self {
            StressError::DataLoad(_) => "data_load",
            StressError::ModelFileMissing { .. } => "model_file_missing",
            StressError::ModelNotLoaded(_) => "model_not_loaded",
            StressError::PredictionInput(_) => "prediction_input",
            StressError::Preprocessing(_) => "preprocessing",
            StressError::Training(_) => "training",
            StressError::Serialization(_) => "serialization",
            StressError::Config(_) => "config",
            StressError::Validation(_) => "validation",
            StressError::Io(_) => "io",
            StressError::ShapeError { .. } => "shape",
            StressError::ModelNotFitted => "model_not_fitted",
        }
    }
}

impl From<polars::error::PolarsError> for StressError {
    fn from(err: polars::error::PolarsError) -> Self {
        StressError::DataLoad(err.to_string())
    }
}

impl From<serde_json::Error> for StressError {
    fn from(err: serde_json::Error) -> Self {
        StressError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for StressError {
    fn from(err: bincode::Error) -> Self {
        StressError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for StressError {
    fn from(err: ndarray::ShapeError) -> Self {
        StressError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

//! Occustress - occupational stress risk prediction
//!
//! This crate trains and serves a binary classifier that estimates whether
//! a worker is under occupational stress from twelve survey answers:
//!
//! - [`features`] - Feature layout and mapping of raw user answers
//! - [`preprocessing`] - Table loading, median imputation, scaling
//! - [`synthetic`] - Minority oversampling behind the `Sampler` trait
//! - [`training`] - Random forest, weighted-F1 hyperparameter selection
//! - [`export`] - Checksummed classifier and scaler artifacts
//! - [`inference`] - Risk bands, recommendations, the model context
//! - [`analysis`] - Descriptive statistics for data exploration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Data
pub mod features;
pub mod preprocessing;
pub mod synthetic;

// Model
pub mod training;
pub mod export;
pub mod inference;

// Exploration
pub mod analysis;

// Services
pub mod cli;

pub use error::{Result, StressError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, StressError};

    // Configuration
    pub use crate::config::PipelineConfig;

    // Features
    pub use crate::features::{FeatureField, FeatureMapper, FeatureVector, RawInput, N_FEATURES};

    // Preprocessing
    pub use crate::preprocessing::{DatasetLoader, DatasetPreparer, FeatureTable, StandardScaler};

    // Synthetic data
    pub use crate::synthetic::{MinorityOverSampler, Sampler};

    // Training
    pub use crate::training::{
        HyperParams, ModelMetrics, ModelSelector, RandomForestClassifier, SelectionConfig,
        TrainedClassifier, Trainer, TrainingConfig,
    };

    // Export
    pub use crate::export::ArtifactStore;

    // Inference
    pub use crate::inference::{
        ErrorReport, LoadOutcome, ModelContext, PredictionReport, PredictionResult, Predictor,
        RiskBand,
    };

    // Analysis
    pub use crate::analysis::DataAnalyzer;
}

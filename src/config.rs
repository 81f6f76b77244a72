//! Pipeline configuration
//!
//! Paths and training settings shared by the CLI and the library entry
//! points. Loaded from a JSON file or built in code; every field has a
//! default so a partial file is enough.

use crate::error::{Result, StressError};
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Labeled survey table used for training and analysis
    pub data_path: PathBuf,

    /// Directory holding the persisted artifacts
    pub model_dir: PathBuf,

    /// File name of the classifier artifact
    pub model_file: String,

    /// File name of the scaler artifact
    pub scaler_file: String,

    /// Number of ranked importances attached to a prediction report
    pub top_features: usize,

    /// Training settings
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("stress_data.csv"),
            model_dir: PathBuf::from("models"),
            model_file: "compatible_stress_model.bin".to_string(),
            scaler_file: "compatible_scaler.bin".to_string(),
            top_features: 5,
            training: TrainingConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StressError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| StressError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn with_top_features(mut self, n: usize) -> Self {
        self.top_features = n;
        self
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir.join(&self.scaler_file)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_file.is_empty() || self.scaler_file.is_empty() {
            return Err(StressError::Config("artifact file names must not be empty".to_string()));
        }
        if self.model_file == self.scaler_file {
            return Err(StressError::Config(
                "classifier and scaler artifacts need distinct file names".to_string(),
            ));
        }
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = PipelineConfig::default();
        assert_eq!(config.model_path(), PathBuf::from("models/compatible_stress_model.bin"));
        assert_eq!(config.scaler_path(), PathBuf::from("models/compatible_scaler.bin"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"model_dir": "/tmp/artifacts", "top_features": 3}"#).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/tmp/artifacts"));
        assert_eq!(config.top_features, 3);
        assert_eq!(config.training.selection.grid.len(), 4);
    }

    #[test]
    fn test_same_artifact_names_rejected() {
        let mut config = PipelineConfig::default();
        config.scaler_file = config.model_file.clone();
        assert!(matches!(config.validate(), Err(StressError::Config(_))));
    }
}

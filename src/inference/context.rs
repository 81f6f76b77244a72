//! Lazily loaded model state for inference

use super::advice::recommendations;
use super::predictor::{PredictionResult, Predictor};
use crate::config::PipelineConfig;
use crate::error::{Result, StressError};
use crate::export::ArtifactStore;
use crate::features::{FeatureMapper, FeatureVector, RawInput};
use crate::preprocessing::StandardScaler;
use crate::training::{TrainedClassifier, Trainer};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How [`ModelContext::ensure_loaded`] obtained a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A model was already installed
    AlreadyLoaded,
    /// Both artifacts were read from disk
    Loaded,
    /// An artifact was missing, so a model was trained and saved
    MissingTriggersRetrain,
}

/// Classifier and scaler installed in a context
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub classifier: TrainedClassifier,
    pub scaler: StandardScaler,
}

/// One ranked importance entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Everything returned for one prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    #[serde(flatten)]
    pub result: PredictionResult,
    /// Heaviest model features, descending
    pub top_features: Vec<FeatureImportance>,
    pub recommendations: Vec<String>,
}

/// Serializable error returned by [`ModelContext::handle`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

impl From<&StressError> for ErrorReport {
    fn from(err: &StressError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Owns the artifact locations and, once loaded, the model itself.
///
/// Nothing is global: callers create a context and pass it where it is
/// needed. Loading happens on first use and falls back to training from
/// the configured dataset when an artifact does not exist yet.
#[derive(Debug)]
pub struct ModelContext {
    config: PipelineConfig,
    store: ArtifactStore,
    mapper: FeatureMapper,
    predictor: Predictor,
    model: Option<LoadedModel>,
}

impl ModelContext {
    pub fn new(config: PipelineConfig) -> Self {
        let store = ArtifactStore::from_config(&config);
        Self {
            config,
            store,
            mapper: FeatureMapper::new(),
            predictor: Predictor::new(),
            model: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    /// Install an already trained model
    pub fn install(&mut self, classifier: TrainedClassifier, scaler: StandardScaler) -> Result<()> {
        Predictor::check_compatible(&classifier, &scaler)?;
        self.model = Some(LoadedModel { classifier, scaler });
        Ok(())
    }

    /// Load the artifacts, retraining when one of them is missing
    pub fn ensure_loaded(&mut self) -> Result<LoadOutcome> {
        if self.model.is_some() {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        match self.store.load() {
            Ok((classifier, scaler)) => {
                self.install(classifier, scaler)?;
                Ok(LoadOutcome::Loaded)
            }
            Err(StressError::ModelFileMissing { path }) => {
                warn!(
                    path = %path.display(),
                    data = %self.config.data_path.display(),
                    "Model artifact missing, retraining"
                );
                self.retrain()?;
                Ok(LoadOutcome::MissingTriggersRetrain)
            }
            Err(e) => Err(e),
        }
    }

    /// Train from the configured dataset, save, and install the result
    pub fn retrain(&mut self) -> Result<()> {
        let trainer = Trainer::new(self.config.training.clone());
        let run = trainer
            .train_and_save(&self.config.data_path, &self.store)
            .map_err(|e| StressError::ModelNotLoaded(format!("retraining failed: {}", e)))?;
        info!(params = %run.classifier.params(), "Installed retrained model");
        self.install(run.classifier, run.scaler)
    }

    fn loaded(&mut self) -> Result<&LoadedModel> {
        self.ensure_loaded()?;
        self.model
            .as_ref()
            .ok_or_else(|| StressError::ModelNotLoaded("no model installed".to_string()))
    }

    pub fn predict_vector(&mut self, vector: &FeatureVector) -> Result<PredictionResult> {
        let predictor = self.predictor;
        let model = self.loaded()?;
        predictor.predict(vector, &model.classifier, &model.scaler)
    }

    /// Ranked `(feature, weight)` pairs of the installed model
    pub fn feature_importance(&mut self) -> Result<Vec<(String, f64)>> {
        Ok(self.loaded()?.classifier.ranked_importances())
    }

    /// Map raw answers, predict, and attach importances and advice
    pub fn predict(&mut self, raw: &RawInput) -> Result<PredictionReport> {
        let mapped = self.mapper.map(raw)?;
        let result = self.predict_vector(&mapped.features)?;
        let top_features = self
            .feature_importance()?
            .into_iter()
            .take(self.config.top_features)
            .map(|(feature, importance)| FeatureImportance { feature, importance })
            .collect();

        Ok(PredictionReport {
            result,
            top_features,
            recommendations: recommendations(result.risk_band)
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })
    }

    /// Like [`predict`](Self::predict), but failures come back as an
    /// [`ErrorReport`] and the context stays usable
    pub fn handle(&mut self, raw: &RawInput) -> std::result::Result<PredictionReport, ErrorReport> {
        self.predict(raw).map_err(|e| {
            warn!(kind = e.kind(), error = %e, "Prediction request failed");
            ErrorReport::from(&e)
        })
    }
}

//! End-to-end training run

use super::config::{HyperParams, TrainingConfig};
use super::metrics::ModelMetrics;
use super::random_forest::RandomForestClassifier;
use super::selector::{CandidateScore, ModelSelector};
use super::split::stratified_split;
use crate::error::{Result, StressError};
use crate::export::ArtifactStore;
use crate::features::FeatureField;
use crate::preprocessing::{DatasetLoader, DatasetPreparer, FeatureTable, PreparationReport, StandardScaler};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Facts about how a classifier was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub trained_at: DateTime<Utc>,
    /// Mean validation weighted F1 of the chosen grid entry
    pub selection_score: f64,
    pub candidate_scores: Vec<CandidateScore>,
    /// Hold-out evaluation of the final model
    pub test_metrics: Option<ModelMetrics>,
    pub n_train: usize,
    pub n_test: usize,
    pub training_time_secs: f64,
}

/// Fitted forest plus everything needed to use it safely
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedClassifier {
    forest: RandomForestClassifier,
    params: HyperParams,
    feature_names: Vec<String>,
    metadata: TrainingMetadata,
}

impl TrainedClassifier {
    pub fn new(
        forest: RandomForestClassifier,
        params: HyperParams,
        feature_names: Vec<String>,
        metadata: TrainingMetadata,
    ) -> Result<Self> {
        if !forest.is_fitted() {
            return Err(StressError::ModelNotFitted);
        }
        if forest.n_features() != feature_names.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} feature names", forest.n_features()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        Ok(Self {
            forest,
            params,
            feature_names,
            metadata,
        })
    }

    pub fn forest(&self) -> &RandomForestClassifier {
        &self.forest
    }

    pub fn params(&self) -> &HyperParams {
        &self.params
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.forest.predict_proba(x)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        self.forest.predict(x)
    }

    /// `(feature name, weight)` pairs, heaviest first
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let Some(importances) = self.forest.feature_importances() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub classifier: TrainedClassifier,
    pub scaler: StandardScaler,
    pub preparation: PreparationReport,
}

impl TrainingRun {
    pub fn test_metrics(&self) -> Option<&ModelMetrics> {
        self.classifier.metadata.test_metrics.as_ref()
    }
}

/// Orchestrates prepare, hold-out split, model selection and evaluation
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load a survey table and train on it
    pub fn train_from_path(&self, path: impl AsRef<Path>) -> Result<TrainingRun> {
        let table = DatasetLoader::new().load(path)?;
        self.train(&table)
    }

    /// Train on `data_path` and write both artifacts to `store`
    pub fn train_and_save(&self, data_path: impl AsRef<Path>, store: &ArtifactStore) -> Result<TrainingRun> {
        let run = self.train_from_path(data_path)?;
        store.save(&run.classifier, &run.scaler)?;
        Ok(run)
    }

    pub fn train(&self, table: &FeatureTable) -> Result<TrainingRun> {
        self.config.validate()?;
        let start = Instant::now();

        let mut preparer = match self.config.oversample_seed {
            Some(seed) => DatasetPreparer::new().with_seed(seed),
            None => DatasetPreparer::new(),
        };
        let prepared = preparer.prepare(table)?;

        let split = stratified_split(&prepared.y, self.config.test_split, self.config.test_split_seed)?;
        let data = split.apply(&prepared.x, &prepared.y);
        info!(
            train = data.y_train.len(),
            test = data.y_test.len(),
            "Split prepared data"
        );

        let outcome = ModelSelector::new(self.config.selection.clone())
            .select_and_fit(&data.x_train, &data.y_train)?;

        let predicted = outcome.classifier.predict(&data.x_test)?;
        let metrics = ModelMetrics::compute(&data.y_test.to_vec(), &predicted.to_vec());
        info!(
            accuracy = metrics.accuracy,
            weighted_f1 = metrics.weighted_f1,
            "Hold-out evaluation"
        );

        let metadata = TrainingMetadata {
            trained_at: Utc::now(),
            selection_score: outcome.best_score,
            candidate_scores: outcome.candidate_scores,
            test_metrics: Some(metrics),
            n_train: data.y_train.len(),
            n_test: data.y_test.len(),
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        let classifier =
            TrainedClassifier::new(outcome.classifier, outcome.best, FeatureField::names(), metadata)?;

        Ok(TrainingRun {
            classifier,
            scaler: prepared.scaler,
            preparation: prepared.report,
        })
    }
}

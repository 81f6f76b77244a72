//! Integration test: artifacts, the model context and request handling

mod common;

use common::{pipeline_config, write_survey_csv};
use occustress::error::StressError;
use occustress::export::ArtifactStore;
use occustress::features::{FeatureMapper, RawInput};
use occustress::inference::{LoadOutcome, ModelContext, Predictor, RiskBand};
use occustress::training::Trainer;
use serde_json::json;
use tempfile::tempdir;

fn stressed_answers() -> RawInput {
    RawInput::new()
        .with("age", 38)
        .with("weekly_hours", 62)
        .with("fatigue_level", 3)
        .with("life_satisfaction", 2)
        .with("income", "low")
}

#[test]
fn test_saved_model_predicts_identically() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("survey.csv");
    write_survey_csv(&data, 120);
    let config = pipeline_config(dir.path(), &data);
    let store = ArtifactStore::from_config(&config);

    let run = Trainer::new(config.training.clone())
        .train_and_save(&data, &store)
        .unwrap();
    assert!(store.exists());

    let (classifier, scaler) = store.load().unwrap();
    assert_eq!(classifier.params(), run.classifier.params());
    assert_eq!(scaler, run.scaler);

    let vector = FeatureMapper::new().map(&stressed_answers()).unwrap().features;
    let before = Predictor::new().predict(&vector, &run.classifier, &run.scaler).unwrap();
    let after = Predictor::new().predict(&vector, &classifier, &scaler).unwrap();
    assert_eq!(before, after);
    assert_eq!(before.probability.to_bits(), after.probability.to_bits());
}

#[test]
fn test_missing_artifacts_trigger_retraining() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("survey.csv");
    write_survey_csv(&data, 120);
    let config = pipeline_config(dir.path(), &data);

    let mut context = ModelContext::new(config.clone());
    assert!(!context.is_loaded());
    assert_eq!(context.ensure_loaded().unwrap(), LoadOutcome::MissingTriggersRetrain);
    assert!(config.model_path().exists());
    assert!(config.scaler_path().exists());
    assert_eq!(context.ensure_loaded().unwrap(), LoadOutcome::AlreadyLoaded);

    // a fresh context now finds the files
    let mut reloaded = ModelContext::new(config);
    assert_eq!(reloaded.ensure_loaded().unwrap(), LoadOutcome::Loaded);
}

#[test]
fn test_retraining_without_data_reports_not_loaded() {
    let dir = tempdir().unwrap();
    let config = pipeline_config(dir.path(), &dir.path().join("absent.csv"));

    let mut context = ModelContext::new(config);
    let err = context.ensure_loaded().unwrap_err();
    assert!(matches!(err, StressError::ModelNotLoaded(_)));

    let report = context.handle(&stressed_answers()).unwrap_err();
    assert_eq!(report.kind, "model_not_loaded");
    assert!(!context.is_loaded());
}

#[test]
fn test_corrupted_artifact_is_a_serialization_error() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("survey.csv");
    write_survey_csv(&data, 80);
    let config = pipeline_config(dir.path(), &data);
    ModelContext::new(config.clone()).ensure_loaded().unwrap();

    let mut bytes = std::fs::read(config.model_path()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(config.model_path(), &bytes).unwrap();

    let mut context = ModelContext::new(config.clone());
    assert!(matches!(context.ensure_loaded(), Err(StressError::Serialization(_))));

    std::fs::write(config.scaler_path(), b"not an artifact").unwrap();
    assert!(matches!(
        read_scaler(&config),
        Err(StressError::Serialization(_))
    ));
}

fn read_scaler(
    config: &occustress::config::PipelineConfig,
) -> occustress::Result<occustress::preprocessing::StandardScaler> {
    occustress::export::read_artifact(&config.scaler_path(), occustress::export::ArtifactKind::Scaler)
}

#[test]
fn test_handle_returns_report_or_error() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("survey.csv");
    write_survey_csv(&data, 120);
    let mut context = ModelContext::new(pipeline_config(dir.path(), &data));

    let report = context.handle(&stressed_answers()).unwrap();
    assert_eq!(report.top_features.len(), 3);
    assert_eq!(report.recommendations.len(), 5);
    assert_eq!(
        RiskBand::from_probability(report.result.probability),
        report.result.risk_band
    );
    let confidence = report.result.probability.max(1.0 - report.result.probability);
    assert!((report.result.confidence - confidence).abs() < 1e-12);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("probability").is_some());
    assert!(json.get("risk_band").unwrap().as_str().unwrap().ends_with("risk"));

    // a bad request does not poison the context
    let bad = RawInput::from_json(&json!({"age": "abc"}).to_string()).unwrap();
    let err = context.handle(&bad).unwrap_err();
    assert_eq!(err.kind, "prediction_input");
    assert!(context.handle(&stressed_answers()).is_ok());
}

#[test]
fn test_band_thresholds() {
    assert_eq!(RiskBand::from_probability(0.299), RiskBand::Low);
    assert_eq!(RiskBand::from_probability(0.3), RiskBand::Medium);
    assert_eq!(RiskBand::from_probability(0.699), RiskBand::Medium);
    assert_eq!(RiskBand::from_probability(0.7), RiskBand::High);
    assert_eq!(RiskBand::from_probability(0.70001), RiskBand::High);
}

//! Integration test: full pipeline (CSV → train → persist → serve → analyze)

mod common;

use common::{pipeline_config, write_survey_csv};
use occustress::analysis::{DataAnalyzer, DataSource, Insight};
use occustress::config::PipelineConfig;
use occustress::features::FeatureField;
use occustress::inference::{LoadOutcome, ModelContext};
use occustress::prelude::*;
use tempfile::tempdir;

#[test]
fn test_full_prediction_pipeline() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("survey.csv");
    write_survey_csv(&data, 150);

    // Step 1: configuration round trip
    let config_path = dir.path().join("pipeline.json");
    pipeline_config(dir.path(), &data).to_json_file(&config_path).unwrap();
    let config = PipelineConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.top_features, 3);

    // Step 2: train and persist
    let store = ArtifactStore::from_config(&config);
    let run = Trainer::new(config.training.clone())
        .train_and_save(&config.data_path, &store)
        .unwrap();
    assert_eq!(run.preparation.rows_loaded, 150);
    assert!(run.preparation.oversampled > 0);

    // Step 3: serve from the saved files
    let mut context = ModelContext::new(config);
    assert_eq!(context.ensure_loaded().unwrap(), LoadOutcome::Loaded);

    let heavy = RawInput::new()
        .with("weekly_hours", 64)
        .with("fatigue_level", "severe")
        .with("life_satisfaction", 2);
    let light = RawInput::new()
        .with("weekly_hours", 36)
        .with("fatigue_level", 0)
        .with("life_satisfaction", 8);

    let heavy_report = context.predict(&heavy).unwrap();
    let light_report = context.predict(&light).unwrap();
    assert!(heavy_report.result.probability > light_report.result.probability);
    assert_eq!(heavy_report.result.prediction, 1);
    assert_eq!(light_report.result.prediction, 0);

    // Step 4: importances match the stored model
    let ranked = context.feature_importance().unwrap();
    assert_eq!(ranked.len(), 12);
    assert!((ranked.iter().map(|(_, w)| w).sum::<f64>() - 1.0).abs() < 1e-9);
    assert_eq!(heavy_report.top_features[0].feature, ranked[0].0);
}

#[test]
fn test_analysis_over_training_data() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("survey.csv");
    write_survey_csv(&data, 90);

    let (analyzer, source) = DataAnalyzer::from_path_or_demo(&data).unwrap();
    assert!(matches!(source, DataSource::File(_)));
    assert_eq!(analyzer.n_samples(), 90);

    let overview = analyzer.overview().unwrap();
    assert!(overview.stress_rate > 0.3);
    assert!(analyzer
        .insights()
        .unwrap()
        .iter()
        .any(|i| matches!(i, Insight::HighStressRate { .. })));

    let by_income = analyzer.group_stats("income", FeatureField::WeeklyHours).unwrap();
    assert_eq!(by_income.len(), 3);
    assert_eq!(by_income.iter().map(|g| g.count).sum::<usize>(), 90);

    let rates = analyzer.stress_rate_by("income").unwrap();
    assert!(rates.iter().all(|r| (0.0..=1.0).contains(&r.stress_rate)));
}

#[test]
fn test_unreadable_data_falls_back_to_demo() {
    let (analyzer, source) = DataAnalyzer::from_path_or_demo("/nonexistent/survey.csv").unwrap();
    assert_eq!(source, DataSource::Demo);
    assert_eq!(analyzer.n_samples(), occustress::analysis::DEMO_ROWS);
}

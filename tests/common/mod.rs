//! Shared survey fixtures

#![allow(dead_code)]

use occustress::config::PipelineConfig;
use occustress::features::{FeatureField, LABEL_COLUMN};
use occustress::training::{HyperParams, SelectionConfig, TrainingConfig};
use polars::prelude::*;
use std::path::Path;

const INCOME: [&str; 3] = ["low", "medium", "high"];

/// One deterministic respondent: `(features in canonical order, income label, stressed)`
pub fn respondent(i: usize) -> ([f64; 12], &'static str, u8) {
    let weekly_hours = 35.0 + ((i * 11) % 30) as f64;
    let fatigue = (i % 4) as f64;
    let life_satisfaction = 1.0 + ((i * 17) % 9) as f64;
    let income = INCOME[(i / 2) % 3];
    let income_code = match income {
        "low" => -1.0,
        "medium" => 0.0,
        _ => 1.0,
    };
    let stressed = weekly_hours >= 55.0 || (fatigue == 3.0 && life_satisfaction <= 4.0);

    let values = [
        22.0 + ((i * 7) % 35) as f64,
        ((i * 3) % 25) as f64,
        ((i * 5) % 10) as f64,
        weekly_hours,
        ((i * 13) % 5) as f64 * 0.5,
        life_satisfaction,
        fatigue,
        income_code,
        (i % 3) as f64,
        (i % 2) as f64,
        ((i * 7) % 4) as f64,
        1.0 + (i % 5) as f64,
    ];
    (values, income, u8::from(stressed))
}

/// Survey CSV with canonical headers; income is written as text
pub fn survey_csv(n: usize) -> String {
    let mut header: Vec<&str> = FeatureField::ALL.iter().map(|f| f.name()).collect();
    header.push(LABEL_COLUMN);
    let mut out = header.join(",");
    out.push('\n');

    for i in 0..n {
        let (values, income, label) = respondent(i);
        let cells: Vec<String> = FeatureField::ALL
            .iter()
            .map(|&f| {
                if f == FeatureField::Income {
                    income.to_string()
                } else {
                    values[f.index()].to_string()
                }
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push_str(&format!(",{}\n", label));
    }
    out
}

pub fn write_survey_csv(path: &Path, n: usize) {
    std::fs::write(path, survey_csv(n)).unwrap();
}

/// Same respondents as [`survey_csv`] as a data frame
pub fn survey_frame(n: usize) -> DataFrame {
    let rows: Vec<_> = (0..n).map(respondent).collect();
    let column_of = |f: FeatureField| rows.iter().map(|r| r.0[f.index()]).collect::<Vec<f64>>();

    df!(
        "age" => column_of(FeatureField::Age),
        "work_years" => column_of(FeatureField::WorkYears),
        "position_years" => column_of(FeatureField::PositionYears),
        "weekly_hours" => column_of(FeatureField::WeeklyHours),
        "daily_overtime" => column_of(FeatureField::DailyOvertime),
        "life_satisfaction" => column_of(FeatureField::LifeSatisfaction),
        "fatigue_level" => column_of(FeatureField::FatigueLevel),
        "income" => rows.iter().map(|r| r.1).collect::<Vec<&str>>(),
        "alcohol" => column_of(FeatureField::Alcohol),
        "low_exercise" => column_of(FeatureField::LowExercise),
        "smoking" => column_of(FeatureField::Smoking),
        "marital_status" => column_of(FeatureField::MaritalStatus),
        "is_stressed" => rows.iter().map(|r| r.2 as i64).collect::<Vec<i64>>()
    )
    .unwrap()
}

/// Two small candidates so tests stay fast
pub fn small_training_config(seed: u64) -> TrainingConfig {
    TrainingConfig::new()
        .with_selection(
            SelectionConfig::new()
                .with_grid(vec![
                    HyperParams::new(12, Some(6), 2),
                    HyperParams::new(8, Some(3), 4),
                ])
                .with_n_repeats(2),
        )
        .with_seed(seed)
}

pub fn pipeline_config(dir: &Path, data: &Path) -> PipelineConfig {
    PipelineConfig::new()
        .with_data_path(data)
        .with_model_dir(dir.join("models"))
        .with_training(small_training_config(7))
        .with_top_features(3)
}

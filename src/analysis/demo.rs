//! Synthetic survey data for exploring the dashboards without a dataset

use crate::error::Result;
use crate::features::{FeatureField, IncomeLevel, LABEL_COLUMN};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Rows in the fallback dataset
pub const DEMO_ROWS: usize = 1000;
/// Seed of the fallback dataset
pub const DEMO_SEED: u64 = 42;

/// Standard normal draw (Box-Muller)
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn normal_column<R: Rng>(rng: &mut R, n: usize, mean: f64, std: f64) -> Vec<f64> {
    (0..n).map(|_| mean + std * standard_normal(rng)).collect()
}

/// Deterministic demo table covering the dashboard columns.
///
/// Columns: age, work_years, weekly_hours, life_satisfaction (normal),
/// fatigue_level (0..=3), income as text (30% low, 50% medium, 20% high)
/// and is_stressed (30% positive). Values are not clipped.
pub fn demo_dataset(n: usize, seed: u64) -> Result<DataFrame> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let age = normal_column(&mut rng, n, 35.0, 10.0);
    let work_years = normal_column(&mut rng, n, 8.0, 6.0);
    let weekly_hours = normal_column(&mut rng, n, 45.0, 8.0);
    let life_satisfaction = normal_column(&mut rng, n, 6.0, 2.0);
    let fatigue: Vec<f64> = (0..n).map(|_| f64::from(rng.gen_range(0u8..4))).collect();
    let income: Vec<&str> = (0..n)
        .map(|_| {
            let u: f64 = rng.gen();
            let level = if u < 0.3 {
                IncomeLevel::Low
            } else if u < 0.8 {
                IncomeLevel::Medium
            } else {
                IncomeLevel::High
            };
            level.label()
        })
        .collect();
    let stressed: Vec<i64> = (0..n).map(|_| i64::from(rng.gen_bool(0.3))).collect();

    let df = df!(
        FeatureField::Age.name() => age,
        FeatureField::WorkYears.name() => work_years,
        FeatureField::WeeklyHours.name() => weekly_hours,
        FeatureField::LifeSatisfaction.name() => life_satisfaction,
        FeatureField::FatigueLevel.name() => fatigue,
        FeatureField::Income.name() => income,
        LABEL_COLUMN => stressed
    )?;
    Ok(df)
}

//! Survey data exploration
//!
//! Computes the figures behind the exploration dashboards (overview,
//! distributions, correlations, group comparisons and rule-based insights)
//! as plain values. Rendering is left to the caller.

mod demo;
pub mod stats;

pub use demo::{demo_dataset, DEMO_ROWS, DEMO_SEED};
pub use stats::{FiveNumberSummary, HistogramBin};

use crate::error::{Result, StressError};
use crate::features::{FeatureField, IncomeLevel, LABEL_ALIAS, LABEL_COLUMN};
use crate::preprocessing::DatasetLoader;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Default fields for the correlation matrix
pub const CORRELATION_FIELDS: [FeatureField; 5] = [
    FeatureField::Age,
    FeatureField::WorkYears,
    FeatureField::WeeklyHours,
    FeatureField::LifeSatisfaction,
    FeatureField::FatigueLevel,
];

/// Stress rate above which an alert is raised
pub const STRESS_RATE_ALERT: f64 = 0.3;
/// Absolute correlation from which hours and fatigue are reported as related
pub const HOURS_FATIGUE_CORRELATION: f64 = 0.3;

/// Where the analyzed data came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    File(String),
    Demo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataOverview {
    pub n_samples: usize,
    pub stress_rate: f64,
    pub mean_age: Option<f64>,
    pub mean_weekly_hours: Option<f64>,
    pub mean_fatigue: Option<f64>,
    pub mean_life_satisfaction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub field: FeatureField,
    pub histogram: Vec<HistogramBin>,
    pub summary: FiveNumberSummary,
    pub mean: f64,
    /// Sample standard deviation; `None` for a single value
    pub std: Option<f64>,
    pub missing: usize,
}

/// Pairwise Pearson correlations; `NaN` where undefined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<FeatureField>,
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: FeatureField, b: FeatureField) -> Option<f64> {
        let i = self.fields.iter().position(|&f| f == a)?;
        let j = self.fields.iter().position(|&f| f == b)?;
        let v = self.values[[i, j]];
        (!v.is_nan()).then_some(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub group: String,
    pub mean: f64,
    /// Sample standard deviation; `None` for a single member
    pub std: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRate {
    pub group: String,
    pub stress_rate: f64,
    pub count: usize,
}

/// Rule-based observation about the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Insight {
    HighStressRate { rate: f64 },
    HoursFatigueCorrelation { r: f64 },
    LowIncomeMoreStressed { low: f64, high: f64 },
}

impl std::fmt::Display for Insight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insight::HighStressRate { rate } => write!(
                f,
                "High risk alert: overall occupational stress rate is {:.1}%",
                rate * 100.0
            ),
            Insight::HoursFatigueCorrelation { r } => {
                let direction = if *r > 0.0 { "positive" } else { "negative" };
                write!(
                    f,
                    "Working hours: weekly hours and fatigue show a {} correlation (r={:.2})",
                    direction, r
                )
            }
            Insight::LowIncomeMoreStressed { low, high } => write!(
                f,
                "Income: the low-income group is more often stressed ({:.1}% vs {:.1}%)",
                low * 100.0,
                high * 100.0
            ),
        }
    }
}

/// Statistics over a raw (unbalanced, unscaled) survey table
#[derive(Debug, Clone)]
pub struct DataAnalyzer {
    df: DataFrame,
    labels: Vec<Option<f64>>,
}

impl DataAnalyzer {
    /// Wrap a frame; original spreadsheet headers are renamed to feature
    /// names. The stress label column is required.
    pub fn new(df: DataFrame) -> Result<Self> {
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let has = |n: &str| names.iter().any(|c| c == n);
        if !has(LABEL_COLUMN) && !has(LABEL_ALIAS) {
            return Err(StressError::DataLoad(format!(
                "required column '{}' is missing",
                LABEL_COLUMN
            )));
        }

        // an alias is only renamed when its canonical column is absent
        let canonical = |header: &str| -> Option<&'static str> {
            FeatureField::ALL
                .iter()
                .find(|f| f.alias() == header && !has(f.name()))
                .map(|f| f.name())
                .or_else(|| (header == LABEL_ALIAS && !has(LABEL_COLUMN)).then_some(LABEL_COLUMN))
        };
        let columns: Vec<Column> = df
            .get_columns()
            .iter()
            .map(|col| match canonical(col.name().as_str()) {
                Some(name) => col.clone().with_name(name.into()),
                None => col.clone(),
            })
            .collect();
        let df = DataFrame::new(columns)?;

        let labels = numeric_column(&df, LABEL_COLUMN)?;
        Ok(Self { df, labels })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let df = DatasetLoader::new().load_frame(path)?;
        Self::new(df)
    }

    /// Load `path`, or fall back to the demo dataset when it cannot be read
    pub fn from_path_or_demo(path: impl AsRef<Path>) -> Result<(Self, DataSource)> {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(analyzer) => Ok((analyzer, DataSource::File(path.display().to_string()))),
            Err(StressError::DataLoad(msg)) => {
                warn!(path = %path.display(), error = %msg, "Falling back to demo dataset");
                let analyzer = Self::new(demo_dataset(DEMO_ROWS, DEMO_SEED)?)?;
                Ok((analyzer, DataSource::Demo))
            }
            Err(e) => Err(e),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn n_samples(&self) -> usize {
        self.df.height()
    }

    fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| c.as_str() == name)
    }

    fn field_values(&self, field: FeatureField) -> Result<Vec<Option<f64>>> {
        numeric_column(&self.df, field.name())
    }

    fn field_mean(&self, field: FeatureField) -> Result<Option<f64>> {
        if !self.has_column(field.name()) {
            return Ok(None);
        }
        let present: Vec<f64> = self.field_values(field)?.into_iter().flatten().collect();
        Ok(stats::mean(&present))
    }

    fn stress_rate(&self) -> f64 {
        let present: Vec<f64> = self.labels.iter().flatten().copied().collect();
        stats::mean(&present).unwrap_or(0.0)
    }

    pub fn overview(&self) -> Result<DataOverview> {
        Ok(DataOverview {
            n_samples: self.n_samples(),
            stress_rate: self.stress_rate(),
            mean_age: self.field_mean(FeatureField::Age)?,
            mean_weekly_hours: self.field_mean(FeatureField::WeeklyHours)?,
            mean_fatigue: self.field_mean(FeatureField::FatigueLevel)?,
            mean_life_satisfaction: self.field_mean(FeatureField::LifeSatisfaction)?,
        })
    }

    /// Histogram and summary statistics of one numeric field
    pub fn distribution(&self, field: FeatureField, bins: usize) -> Result<Distribution> {
        let values = self.field_values(field)?;
        let missing = values.iter().filter(|v| v.is_none()).count();
        let present: Vec<f64> = values.into_iter().flatten().collect();

        let summary = FiveNumberSummary::from_values(&present).ok_or_else(|| {
            StressError::Validation(format!("column '{}' has no values", field))
        })?;

        Ok(Distribution {
            field,
            histogram: stats::histogram(&present, bins),
            summary,
            mean: stats::mean(&present).unwrap_or(f64::NAN),
            std: stats::std_dev(&present, 1),
            missing,
        })
    }

    pub fn correlation(&self, fields: &[FeatureField]) -> Result<CorrelationMatrix> {
        let columns = fields
            .iter()
            .map(|&f| self.field_values(f))
            .collect::<Result<Vec<_>>>()?;

        let n = fields.len();
        let mut values = Array2::from_elem((n, n), f64::NAN);
        for i in 0..n {
            for j in i..n {
                let r = if i == j {
                    let distinct = stats::pearson(&columns[i], &columns[j]);
                    distinct.map(|_| 1.0)
                } else {
                    stats::pearson(&columns[i], &columns[j])
                };
                let r = r.unwrap_or(f64::NAN);
                values[[i, j]] = r;
                values[[j, i]] = r;
            }
        }

        Ok(CorrelationMatrix {
            fields: fields.to_vec(),
            values,
        })
    }

    /// Labels of `group_by`, one per row
    fn group_keys(&self, group_by: &str) -> Result<Vec<Option<String>>> {
        let column = self.df.column(group_by).map_err(|_| {
            StressError::Validation(format!("group column '{}' does not exist", group_by))
        })?;
        let as_text = column.as_materialized_series().cast(&DataType::String)?;
        let ca = as_text.str()?;
        Ok(ca
            .into_iter()
            .map(|cell| cell.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
            .collect())
    }

    fn grouped(&self, group_by: &str, values: &[Option<f64>]) -> Result<BTreeMap<String, Vec<f64>>> {
        let keys = self.group_keys(group_by)?;
        let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (key, value) in keys.into_iter().zip(values.iter()) {
            if let (Some(key), Some(value)) = (key, value) {
                groups.entry(key).or_default().push(*value);
            }
        }
        if groups.len() < 2 {
            return Err(StressError::Validation(format!(
                "cannot compare groups: '{}' has {} distinct value(s)",
                group_by,
                groups.len()
            )));
        }
        Ok(groups)
    }

    /// Mean, sample std and count of `metric` per distinct `group_by` value
    pub fn group_stats(&self, group_by: &str, metric: FeatureField) -> Result<Vec<GroupStat>> {
        let values = self.field_values(metric)?;
        let groups = self.grouped(group_by, &values)?;
        Ok(groups
            .into_iter()
            .map(|(group, members)| GroupStat {
                mean: stats::mean(&members).unwrap_or(f64::NAN),
                std: stats::std_dev(&members, 1),
                count: members.len(),
                group,
            })
            .collect())
    }

    /// Share of stressed rows per distinct `group_by` value
    pub fn stress_rate_by(&self, group_by: &str) -> Result<Vec<GroupRate>> {
        let groups = self.grouped(group_by, &self.labels)?;
        Ok(groups
            .into_iter()
            .map(|(group, members)| GroupRate {
                stress_rate: stats::mean(&members).unwrap_or(0.0),
                count: members.len(),
                group,
            })
            .collect())
    }

    pub fn insights(&self) -> Result<Vec<Insight>> {
        let mut insights = Vec::new();

        let rate = self.stress_rate();
        if rate > STRESS_RATE_ALERT {
            insights.push(Insight::HighStressRate { rate });
        }

        if self.has_column(FeatureField::WeeklyHours.name())
            && self.has_column(FeatureField::FatigueLevel.name())
        {
            let hours = self.field_values(FeatureField::WeeklyHours)?;
            let fatigue = self.field_values(FeatureField::FatigueLevel)?;
            if let Some(r) = stats::pearson(&hours, &fatigue) {
                if r.abs() > HOURS_FATIGUE_CORRELATION {
                    insights.push(Insight::HoursFatigueCorrelation { r });
                }
            }
        }

        if self.has_column(FeatureField::Income.name()) {
            match self.stress_rate_by(FeatureField::Income.name()) {
                Ok(rates) => {
                    let rate_of = |level: IncomeLevel| {
                        rates
                            .iter()
                            .find(|g| income_level(&g.group) == Some(level))
                            .map(|g| g.stress_rate)
                    };
                    match (rate_of(IncomeLevel::Low), rate_of(IncomeLevel::High)) {
                        (Some(low), Some(high)) if low > high => {
                            insights.push(Insight::LowIncomeMoreStressed { low, high });
                        }
                        (Some(_), Some(_)) => {}
                        _ => info!("Income groups incomplete, skipping income insight"),
                    }
                }
                Err(StressError::Validation(msg)) => info!(reason = %msg, "Skipping income insight"),
                Err(e) => return Err(e),
            }
        }

        Ok(insights)
    }
}

/// Income level of a group label, text or numeric code
fn income_level(group: &str) -> Option<IncomeLevel> {
    IncomeLevel::parse(group).or_else(|| group.parse::<f64>().ok().and_then(IncomeLevel::from_code))
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| StressError::Validation(format!("column '{}' does not exist", name)))?;
    let series = column.as_materialized_series();
    if matches!(series.dtype(), DataType::String) {
        let ca = series.str()?;
        return Ok(ca
            .into_iter()
            .map(|cell| cell.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect());
    }
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

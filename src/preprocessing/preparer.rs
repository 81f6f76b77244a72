//! Training data preparation: impute, balance, scale

use super::{median, DatasetLoader, FeatureTable, MedianImputer, StandardScaler};
use crate::error::{Result, StressError};
use crate::features::{FeatureField, LABEL_COLUMN, N_FEATURES};
use crate::synthetic::{class_counts, MinorityOverSampler, Sampler};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

/// What happened to the data during preparation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparationReport {
    /// Rows in the source table
    pub rows_loaded: usize,
    /// Cells filled with the column median, per column name; a missing
    /// label counts under the label column
    pub imputed: BTreeMap<String, usize>,
    /// Class counts before balancing
    pub class_counts_before: BTreeMap<u8, usize>,
    /// Class counts after balancing
    pub class_counts_after: BTreeMap<u8, usize>,
    /// Rows appended by the sampler
    pub oversampled: usize,
    /// Sampler used
    pub sampler: String,
}

/// Output of [`DatasetPreparer::prepare`]
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Balanced, standardized feature matrix
    pub x: Array2<f64>,
    /// Labels aligned with `x`
    pub y: Array1<u8>,
    /// Scaler fitted on the balanced matrix
    pub scaler: StandardScaler,
    pub report: PreparationReport,
}

/// Turns a raw survey table into model-ready training data.
///
/// Steps, in order: median imputation per column (the label included),
/// class balancing through a [`Sampler`], standardization.
pub struct DatasetPreparer {
    sampler: Box<dyn Sampler>,
}

impl Default for DatasetPreparer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DatasetPreparer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetPreparer")
            .field("sampler", &self.sampler.name())
            .finish()
    }
}

impl DatasetPreparer {
    /// Preparer with an unseeded [`MinorityOverSampler`]
    pub fn new() -> Self {
        Self {
            sampler: Box::new(MinorityOverSampler::new()),
        }
    }

    /// Use a seeded [`MinorityOverSampler`]
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_sampler(MinorityOverSampler::new().with_seed(seed))
    }

    /// Replace the balancing strategy
    pub fn with_sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// Prepare a data frame read by [`DatasetLoader`]
    pub fn prepare_frame(&mut self, df: &DataFrame) -> Result<PreparedData> {
        let table = DatasetLoader::table_from_frame(df)?;
        self.prepare(&table)
    }

    pub fn prepare(&mut self, table: &FeatureTable) -> Result<PreparedData> {
        let start = Instant::now();
        let rows_loaded = table.n_rows();
        if rows_loaded == 0 {
            return Err(StressError::DataLoad("dataset has no rows".to_string()));
        }

        let mut imputer = MedianImputer::new();
        let (mut table, filled) = imputer.fit_transform(table)?;
        for (field, count) in &filled {
            info!(column = field.name(), count, "Filled missing values with column median");
        }

        let labels_filled = Self::impute_labels(&mut table)?;

        let (x, y) = Self::to_arrays(&table)?;
        let class_counts_before = class_counts(&y);

        let balanced = self.sampler.fit_resample(&x, &y)?;
        let class_counts_after = class_counts(&balanced.y);
        info!(
            sampler = self.sampler.name(),
            added = balanced.n_added,
            before = ?class_counts_before,
            after = ?class_counts_after,
            "Balanced classes"
        );

        let mut scaler = StandardScaler::new(FeatureField::names());
        let x_scaled = scaler.fit_transform(&balanced.x)?;

        info!(
            rows = x_scaled.nrows(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Prepared training data"
        );

        Ok(PreparedData {
            x: x_scaled,
            y: balanced.y,
            scaler,
            report: PreparationReport {
                rows_loaded,
                imputed: filled
                    .into_iter()
                    .map(|(f, n)| (f.name().to_string(), n))
                    .chain((labels_filled > 0).then_some((LABEL_COLUMN.to_string(), labels_filled)))
                    .collect(),
                class_counts_before,
                class_counts_after,
                oversampled: balanced.n_added,
                sampler: self.sampler.name().to_string(),
            },
        })
    }

    /// Fill missing labels with the label median, truncated to an integer
    fn impute_labels(table: &mut FeatureTable) -> Result<usize> {
        let present: Vec<f64> = table.labels().iter().flatten().copied().collect();
        let fill = median(&present)
            .ok_or_else(|| StressError::DataLoad("no labeled rows in dataset".to_string()))?
            .trunc();

        let mut filled = 0;
        for label in table.labels_mut().iter_mut().filter(|l| l.is_none()) {
            *label = Some(fill);
            filled += 1;
        }
        if filled > 0 {
            warn!(rows = filled, fill, "Filled missing stress labels with the label median");
        }
        Ok(filled)
    }

    /// Convert a fully imputed, fully labeled table to matrices
    fn to_arrays(table: &FeatureTable) -> Result<(Array2<f64>, Array1<u8>)> {
        let n = table.n_rows();
        let mut x = Array2::<f64>::zeros((n, N_FEATURES));
        for field in FeatureField::ALL {
            for (i, cell) in table.column(field).iter().enumerate() {
                x[[i, field.index()]] = cell.ok_or_else(|| {
                    StressError::Preprocessing(format!("column '{}' still has missing values", field))
                })?;
            }
        }

        let y = table
            .labels()
            .iter()
            .map(|label| match label {
                Some(v) if *v == 0.0 => Ok(0u8),
                Some(v) if *v == 1.0 => Ok(1u8),
                Some(v) => Err(StressError::DataLoad(format!(
                    "label must be 0 or 1, found {}",
                    v
                ))),
                None => Err(StressError::Preprocessing("unlabeled row".to_string())),
            })
            .collect::<Result<Array1<u8>>>()?;

        Ok((x, y))
    }
}

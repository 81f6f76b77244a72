//! Column-oriented survey table with optional values

use crate::error::{Result, StressError};
use crate::features::{FeatureField, FeatureVector, N_FEATURES};
use serde::{Deserialize, Serialize};

/// Raw survey records: one nullable column per feature plus the label.
///
/// Categorical fields are already encoded to their numeric codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<Vec<Option<f64>>>,
    labels: Vec<Option<f64>>,
}

impl FeatureTable {
    /// Build from columns in canonical feature order
    pub fn new(columns: Vec<Vec<Option<f64>>>, labels: Vec<Option<f64>>) -> Result<Self> {
        if columns.len() != N_FEATURES {
            return Err(StressError::ShapeError {
                expected: format!("{} columns", N_FEATURES),
                actual: format!("{} columns", columns.len()),
            });
        }
        if let Some((i, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != labels.len()) {
            return Err(StressError::ShapeError {
                expected: format!("{} rows in '{}'", labels.len(), FeatureField::ALL[i]),
                actual: format!("{} rows", col.len()),
            });
        }
        Ok(Self { columns, labels })
    }

    /// Build from complete rows
    pub fn from_rows(rows: &[(FeatureVector, u8)]) -> Self {
        let columns = FeatureField::ALL
            .iter()
            .map(|&f| rows.iter().map(|(v, _)| Some(v[f])).collect())
            .collect();
        let labels = rows.iter().map(|(_, y)| Some(f64::from(*y))).collect();
        Self { columns, labels }
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn column(&self, field: FeatureField) -> &[Option<f64>] {
        &self.columns[field.index()]
    }

    pub fn column_mut(&mut self, field: FeatureField) -> &mut Vec<Option<f64>> {
        &mut self.columns[field.index()]
    }

    pub fn labels(&self) -> &[Option<f64>] {
        &self.labels
    }

    /// Missing cells per feature
    pub fn null_counts(&self) -> Vec<(FeatureField, usize)> {
        FeatureField::ALL
            .iter()
            .map(|&f| (f, self.column(f).iter().filter(|v| v.is_none()).count()))
            .collect()
    }

    pub fn labels_mut(&mut self) -> &mut Vec<Option<f64>> {
        &mut self.labels
    }

    /// Non-missing values of a column
    pub fn present(&self, field: FeatureField) -> Vec<f64> {
        self.column(field).iter().flatten().copied().collect()
    }
}

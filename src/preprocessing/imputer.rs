//! Missing value imputation

use super::FeatureTable;
use crate::error::{Result, StressError};
use crate::features::FeatureField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Median of a slice, averaging the two middle values for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Per-column median imputer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedianImputer {
    fill_values: BTreeMap<usize, f64>,
    is_fitted: bool,
}

impl MedianImputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the median of every feature column from its present values
    pub fn fit(&mut self, table: &FeatureTable) -> Result<&mut Self> {
        self.fill_values.clear();
        for field in FeatureField::ALL {
            let present = table.present(field);
            let fill = median(&present).ok_or_else(|| {
                StressError::DataLoad(format!("column '{}' has no values to impute from", field))
            })?;
            self.fill_values.insert(field.index(), fill);
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing cells with the fitted medians. Returns the filled
    /// table and the number of cells filled per column.
    pub fn transform(&self, table: &FeatureTable) -> Result<(FeatureTable, Vec<(FeatureField, usize)>)> {
        if !self.is_fitted {
            return Err(StressError::ModelNotFitted);
        }

        let mut result = table.clone();
        let mut filled = Vec::new();
        for field in FeatureField::ALL {
            let fill = self.fill_values[&field.index()];
            let mut count = 0;
            for cell in result.column_mut(field).iter_mut().filter(|c| c.is_none()) {
                *cell = Some(fill);
                count += 1;
            }
            if count > 0 {
                filled.push((field, count));
            }
        }
        Ok((result, filled))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, table: &FeatureTable) -> Result<(FeatureTable, Vec<(FeatureField, usize)>)> {
        self.fit(table)?;
        self.transform(table)
    }

    /// Fitted fill value for a field
    pub fn fill_value(&self, field: FeatureField) -> Option<f64> {
        self.fill_values.get(&field.index()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::N_FEATURES;

    fn table_with_gaps() -> FeatureTable {
        let mut columns = vec![vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]; N_FEATURES];
        columns[FeatureField::Age.index()] = vec![Some(20.0), None, Some(40.0), Some(30.0)];
        columns[FeatureField::Smoking.index()] = vec![None, Some(5.0), Some(1.0), None];
        FeatureTable::new(columns, vec![Some(0.0), Some(1.0), Some(0.0), Some(1.0)]).unwrap()
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_fills_per_column_median() {
        let mut imputer = MedianImputer::new();
        let (filled, counts) = imputer.fit_transform(&table_with_gaps()).unwrap();

        assert_eq!(filled.column(FeatureField::Age)[1], Some(30.0));
        assert_eq!(filled.column(FeatureField::Smoking), &[Some(3.0), Some(5.0), Some(1.0), Some(3.0)]);
        assert!(counts.contains(&(FeatureField::Age, 1)));
        assert!(counts.contains(&(FeatureField::Smoking, 2)));
        assert!(filled.null_counts().iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_imputation_preserves_median() {
        let mut imputer = MedianImputer::new();
        let (filled, _) = imputer.fit_transform(&table_with_gaps()).unwrap();

        let mut again = MedianImputer::new();
        again.fit(&filled).unwrap();
        for field in FeatureField::ALL {
            assert_eq!(imputer.fill_value(field), again.fill_value(field), "{}", field);
        }
        let (twice, counts) = again.transform(&filled).unwrap();
        assert_eq!(twice, filled);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_all_missing_column_fails() {
        let mut columns = vec![vec![Some(1.0)]; N_FEATURES];
        columns[FeatureField::Alcohol.index()] = vec![None];
        let table = FeatureTable::new(columns, vec![Some(0.0)]).unwrap();
        assert!(matches!(MedianImputer::new().fit(&table), Err(StressError::DataLoad(_))));
    }

    #[test]
    fn test_transform_before_fit() {
        assert!(MedianImputer::new().transform(&table_with_gaps()).is_err());
    }
}

//! Survey table loading

use super::FeatureTable;
use crate::error::{Result, StressError};
use crate::features::{FeatureField, IncomeLevel, MaritalStatus, LABEL_ALIAS, LABEL_COLUMN};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rows used for CSV schema inference
const INFER_SCHEMA_ROWS: usize = 1000;

/// Loader for CSV, JSON and Parquet survey tables
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader;

impl DatasetLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self
    }

    /// Detect file format from extension and load
    pub fn load_frame(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let open = || {
            File::open(path)
                .map_err(|e| StressError::DataLoad(format!("{}: {}", path.display(), e)))
        };

        let df = match ext.as_str() {
            "csv" | "tsv" => {
                let separator = if ext == "tsv" { b'\t' } else { b',' };
                CsvReadOptions::default()
                    .with_has_header(true)
                    .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
                    .with_parse_options(CsvParseOptions::default().with_separator(separator))
                    .into_reader_with_file_handle(open()?)
                    .finish()
            }
            "json" | "jsonl" => JsonReader::new(open()?).finish(),
            "parquet" | "pq" => ParquetReader::new(open()?).finish(),
            other => {
                return Err(StressError::DataLoad(format!(
                    "unsupported table format '{}' ({})",
                    other,
                    path.display()
                )))
            }
        }
        .map_err(|e| StressError::DataLoad(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            "Loaded survey table"
        );
        Ok(df)
    }

    /// Load a file straight into a [`FeatureTable`]
    pub fn load(&self, path: impl AsRef<Path>) -> Result<FeatureTable> {
        let df = self.load_frame(path)?;
        Self::table_from_frame(&df)
    }

    /// Extract the twelve features and the label from a data frame.
    ///
    /// Columns are matched by canonical name first, then by the original
    /// spreadsheet header.
    pub fn table_from_frame(df: &DataFrame) -> Result<FeatureTable> {
        let columns = FeatureField::ALL
            .iter()
            .map(|&field| {
                let column = Self::find_column(df, field.name(), field.alias())?;
                Self::column_values(column, field)
            })
            .collect::<Result<Vec<_>>>()?;

        let label = Self::find_column(df, LABEL_COLUMN, LABEL_ALIAS)?;
        let labels = Self::numeric_values(label, LABEL_COLUMN)?;

        FeatureTable::new(columns, labels)
    }

    fn find_column<'a>(df: &'a DataFrame, name: &str, alias: &str) -> Result<&'a Column> {
        df.column(name)
            .or_else(|_| df.column(alias))
            .map_err(|_| StressError::DataLoad(format!("required column '{}' is missing", name)))
    }

    fn column_values(column: &Column, field: FeatureField) -> Result<Vec<Option<f64>>> {
        let series = column.as_materialized_series();
        if !matches!(series.dtype(), DataType::String) {
            return Self::numeric_values(column, field.name());
        }

        let ca = series
            .str()
            .map_err(|e| StressError::DataLoad(e.to_string()))?;

        let mut unknown = 0usize;
        let values: Vec<Option<f64>> = ca
            .into_iter()
            .map(|cell| {
                let cell = cell?.trim();
                if cell.is_empty() {
                    return None;
                }
                let code = match field {
                    FeatureField::Income => IncomeLevel::parse(cell).map(IncomeLevel::code),
                    FeatureField::MaritalStatus => MaritalStatus::parse(cell).map(MaritalStatus::code),
                    _ => None,
                };
                let value = code.or_else(|| cell.parse::<f64>().ok());
                if value.is_none() {
                    unknown += 1;
                }
                value
            })
            .collect();

        if unknown > 0 {
            warn!(column = field.name(), count = unknown, "Unrecognized cells treated as missing");
        } else {
            debug!(column = field.name(), "Decoded text column");
        }
        Ok(values)
    }

    fn numeric_values(column: &Column, name: &str) -> Result<Vec<Option<f64>>> {
        let series = column.as_materialized_series();
        if matches!(series.dtype(), DataType::String) {
            let ca = series
                .str()
                .map_err(|e| StressError::DataLoad(e.to_string()))?;
            return Ok(ca
                .into_iter()
                .map(|cell| cell.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect());
        }

        let casted = series.cast(&DataType::Float64).map_err(|e| {
            StressError::DataLoad(format!("column '{}' is not numeric: {}", name, e))
        })?;
        let ca = casted
            .f64()
            .map_err(|e| StressError::DataLoad(e.to_string()))?;
        Ok(ca.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey_frame() -> DataFrame {
        df!(
            "age" => &[30.0, 45.0, 28.0],
            "work_years" => &[5.0, 20.0, 3.0],
            "position_years" => &[2.0, 10.0, 1.0],
            "weekly_hours" => &[Some(40.0), None, Some(60.0)],
            "daily_overtime" => &[0.0, 1.0, 3.0],
            "life_satisfaction" => &[7.0, 5.0, 3.0],
            "fatigue_level" => &[0.0, 1.0, 3.0],
            "income" => &["low", "高", "unknown"],
            "alcohol" => &[0.0, 2.0, 5.0],
            "low_exercise" => &[2.0, 1.0, 0.0],
            "smoking" => &[0.0, 0.0, 10.0],
            "marital_status" => &[1i64, 2, 4],
            "is_stressed" => &[0i64, 0, 1]
        )
        .unwrap()
    }

    #[test]
    fn test_table_from_frame() {
        let table = DatasetLoader::table_from_frame(&survey_frame()).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column(FeatureField::WeeklyHours), &[Some(40.0), None, Some(60.0)]);
        assert_eq!(table.column(FeatureField::Income), &[Some(-1.0), Some(1.0), None]);
        assert_eq!(table.column(FeatureField::MaritalStatus), &[Some(1.0), Some(2.0), Some(4.0)]);
        assert_eq!(table.labels(), &[Some(0.0), Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_missing_column_is_data_load_error() {
        let df = survey_frame().drop("smoking").unwrap();
        let err = DatasetLoader::table_from_frame(&df).unwrap_err();
        assert!(matches!(err, StressError::DataLoad(msg) if msg.contains("smoking")));
    }

    #[test]
    fn test_alias_headers_accepted() {
        let mut df = survey_frame();
        df.rename("age", "年龄".into()).unwrap();
        df.rename("is_stressed", "是否职业紧张".into()).unwrap();
        let table = DatasetLoader::table_from_frame(&df).unwrap();
        assert_eq!(table.column(FeatureField::Age)[1], Some(45.0));
    }

    #[test]
    fn test_unreadable_file() {
        let err = DatasetLoader::new().load("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, StressError::DataLoad(_)));

        let err = DatasetLoader::new().load("survey.xlsx").unwrap_err();
        assert!(matches!(err, StressError::DataLoad(_)));
    }
}

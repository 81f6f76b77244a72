//! Survey data preprocessing
//!
//! - [`DatasetLoader`]: CSV / JSON / Parquet tables into a [`FeatureTable`]
//! - [`MedianImputer`]: per-column median fill
//! - [`StandardScaler`]: z-score scaling persisted next to the model
//! - [`DatasetPreparer`]: the full impute, balance, scale sequence

mod imputer;
mod loader;
mod preparer;
mod scaler;
mod table;

pub use imputer::{median, MedianImputer};
pub use loader::DatasetLoader;
pub use preparer::{DatasetPreparer, PreparationReport, PreparedData};
pub use scaler::StandardScaler;
pub use table::FeatureTable;

//! Stress risk inference
//!
//! [`Predictor`] turns a feature vector into a [`PredictionResult`];
//! [`ModelContext`] owns the loaded artifacts and serves whole requests.

mod advice;
mod context;
mod predictor;

pub use advice::recommendations;
pub use context::{ErrorReport, FeatureImportance, LoadOutcome, LoadedModel, ModelContext, PredictionReport};
pub use predictor::{PredictionResult, Predictor, RiskBand, HIGH_RISK_FROM, LOW_RISK_BELOW};

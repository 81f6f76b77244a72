//! Single-record stress prediction

use crate::error::{Result, StressError};
use crate::features::{FeatureField, FeatureVector};
use crate::preprocessing::StandardScaler;
use crate::training::TrainedClassifier;
use serde::{Deserialize, Serialize};

/// Probability below which risk is low
pub const LOW_RISK_BELOW: f64 = 0.3;
/// Probability from which risk is high
pub const HIGH_RISK_FROM: f64 = 0.7;

/// Banded stress risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    #[serde(rename = "low risk")]
    Low,
    #[serde(rename = "medium risk")]
    Medium,
    #[serde(rename = "high risk")]
    High,
}

impl RiskBand {
    /// `p < 0.3` low, `0.3 <= p < 0.7` medium, `p >= 0.7` high
    pub fn from_probability(p: f64) -> Self {
        if p < LOW_RISK_BELOW {
            RiskBand::Low
        } else if p < HIGH_RISK_FROM {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "low risk",
            RiskBand::Medium => "medium risk",
            RiskBand::High => "high risk",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class, 1 = stressed
    pub prediction: u8,
    /// Probability of the stressed class
    pub probability: f64,
    pub risk_band: RiskBand,
    /// Probability of the predicted class
    pub confidence: f64,
}

/// Stateless predictor over a classifier and its scaler
#[derive(Debug, Clone, Copy, Default)]
pub struct Predictor;

impl Predictor {
    pub fn new() -> Self {
        Self
    }

    /// Reject artifacts whose feature layout differs from [`FeatureField::ALL`]
    pub fn check_compatible(classifier: &TrainedClassifier, scaler: &StandardScaler) -> Result<()> {
        let canonical = FeatureField::names();
        if classifier.feature_names() != canonical.as_slice() {
            return Err(StressError::PredictionInput(format!(
                "classifier features {:?} do not match expected order {:?}",
                classifier.feature_names(),
                canonical
            )));
        }
        if scaler.feature_names() != canonical.as_slice() {
            return Err(StressError::PredictionInput(format!(
                "scaler features {:?} do not match expected order {:?}",
                scaler.feature_names(),
                canonical
            )));
        }
        if !scaler.is_fitted() {
            return Err(StressError::ModelNotFitted);
        }
        Ok(())
    }

    pub fn predict(
        &self,
        vector: &FeatureVector,
        classifier: &TrainedClassifier,
        scaler: &StandardScaler,
    ) -> Result<PredictionResult> {
        vector.validate()?;
        Self::check_compatible(classifier, scaler)?;

        let scaled = scaler.transform_vector(vector)?;
        let proba = classifier.predict_proba(&scaled)?;
        let (p0, p1) = (proba[[0, 0]], proba[[0, 1]]);

        let prediction = u8::from(p1 > p0);
        Ok(PredictionResult {
            prediction,
            probability: p1,
            risk_band: RiskBand::from_probability(p1),
            confidence: p0.max(p1),
        })
    }
}

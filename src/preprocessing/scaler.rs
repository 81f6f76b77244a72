//! Feature standardization

use crate::error::{Result, StressError};
use crate::features::FeatureVector;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Z-score scaler: `(x - mean) / std`, with population standard deviation.
///
/// Zero-variance columns get a scale of 1.0, so they transform to zero
/// instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Array1<f64>,
    scale: Array1<f64>,
    is_fitted: bool,
}

impl StandardScaler {
    /// Create a new scaler for the named features
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            mean: Array1::zeros(0),
            scale: Array1::zeros(0),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.ncols() != self.feature_names.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} columns", self.feature_names.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        if x.nrows() == 0 {
            return Err(StressError::Preprocessing("cannot fit scaler on zero rows".to_string()));
        }

        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            StressError::Preprocessing("mean of empty matrix".to_string())
        })?;
        let std = x.std_axis(Axis(0), 0.0);

        self.scale = std.mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });
        self.mean = mean;
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(StressError::ModelNotFitted);
        }
        if x.ncols() != self.mean.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} columns", self.mean.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            row -= &self.mean;
            row /= &self.scale;
        }
        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Scale a single feature vector into a one-row matrix
    pub fn transform_vector(&self, vector: &FeatureVector) -> Result<Array2<f64>> {
        self.transform(&vector.to_row())
    }

    /// Inverse transform the data
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(StressError::ModelNotFitted);
        }
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            row *= &self.scale;
            row += &self.mean;
        }
        Ok(out)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];
        let mut scaler = StandardScaler::new(names(2));
        let result = scaler.fit_transform(&x).unwrap();

        for col in result.columns() {
            let mean = col.mean().unwrap();
            let std = col.std(0.0);
            assert!(mean.abs() < 1e-10);
            assert!((std - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_zero_variance_column() {
        let x = array![[0.0, 1.0], [0.0, 2.0], [0.0, 3.0]];
        let mut scaler = StandardScaler::new(names(2));
        let result = scaler.fit_transform(&x).unwrap();

        assert_eq!(scaler.scale()[0], 1.0);
        assert!(result.column(0).iter().all(|v| *v == 0.0));
        assert!(result.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0, -3.0], [2.0, 0.5], [7.0, 9.0]];
        let mut scaler = StandardScaler::new(names(2));
        let scaled = scaler.fit_transform(&x).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (o, r) in x.iter().zip(restored.iter()) {
            assert!((o - r).abs() < 1e-10);
        }
    }

    #[test]
    fn test_column_mismatch() {
        let mut scaler = StandardScaler::new(names(2));
        assert!(scaler.fit(&array![[1.0, 2.0, 3.0]]).is_err());
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = StandardScaler::new(names(1));
        assert!(matches!(scaler.transform(&array![[1.0]]), Err(StressError::ModelNotFitted)));
    }
}

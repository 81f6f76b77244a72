//! Class balancing
//!
//! Resampling strategies sit behind the [`Sampler`] trait so the dataset
//! preparer does not depend on any one of them. The default is
//! [`MinorityOverSampler`], which duplicates positive rows.

mod random_sampling;

pub use random_sampling::MinorityOverSampler;

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<u8>,
    /// Number of rows added by the sampler
    pub n_added: usize,
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<u8>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }

    /// Short name for logs and reports
    fn name(&self) -> &'static str;
}

/// Get class distribution
pub fn class_counts(y: &Array1<u8>) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class
pub fn class_indices(y: &Array1<u8>) -> BTreeMap<u8, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_class_counts_and_indices() {
        let y = array![0u8, 1, 0, 0, 1];
        let counts = class_counts(&y);
        assert_eq!(counts[&0], 3);
        assert_eq!(counts[&1], 2);

        let indices = class_indices(&y);
        assert_eq!(indices[&1], vec![1, 4]);
    }
}

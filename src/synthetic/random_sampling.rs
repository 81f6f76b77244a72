//! Random duplication of positive samples

use crate::error::{Result, StressError};
use crate::synthetic::{class_counts, class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Label of the class that gets duplicated
const POSITIVE: u8 = 1;
const NEGATIVE: u8 = 0;

/// Oversampler that duplicates positive rows until the classes are even.
///
/// Only the positive class is ever grown and only when it is the smaller
/// one. Rows are copied unchanged; no synthetic points are created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinorityOverSampler {
    /// Random seed
    seed: Option<u64>,
    /// Rows to add, computed by `fit`
    deficit: Option<usize>,
}

impl MinorityOverSampler {
    /// Create new oversampler
    pub fn new() -> Self {
        Self::default()
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rows `resample` will append (available after `fit`)
    pub fn deficit(&self) -> Option<usize> {
        self.deficit
    }
}

impl Sampler for MinorityOverSampler {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(StressError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let counts = class_counts(y);
        let n_pos = counts.get(&POSITIVE).copied().unwrap_or(0);
        let n_neg = counts.get(&NEGATIVE).copied().unwrap_or(0);
        let deficit = n_neg.saturating_sub(n_pos);

        if deficit > 0 && n_pos == 0 {
            return Err(StressError::Preprocessing(
                "cannot oversample: dataset contains no positive samples".to_string(),
            ));
        }

        self.deficit = Some(deficit);
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<u8>) -> Result<ResampleResult> {
        let deficit = self.deficit.ok_or_else(|| {
            StressError::Validation("Sampler not fitted".to_string())
        })?;

        if deficit == 0 {
            return Ok(ResampleResult {
                x: x.to_owned(),
                y: y.to_owned(),
                n_added: 0,
            });
        }

        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let indices = class_indices(y);
        let positives = indices.get(&POSITIVE).ok_or_else(|| {
            StressError::Preprocessing("no positive samples to duplicate".to_string())
        })?;

        let mut selected: Vec<usize> = (0..x.nrows()).collect();
        selected.extend((0..deficit).map(|_| positives[rng.gen_range(0..positives.len())]));

        let result_x = x.select(Axis(0), &selected);
        let result_y: Array1<u8> = selected.iter().map(|&i| y[i]).collect();

        Ok(ResampleResult {
            x: result_x,
            y: result_y,
            n_added: deficit,
        })
    }

    fn name(&self) -> &'static str {
        "minority_oversampler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_imbalanced_data() -> (Array2<f64>, Array1<u8>) {
        let mut data = Vec::new();
        let mut labels = Vec::new();

        for i in 0..30 {
            data.push((i % 6) as f64);
            data.push((i / 6) as f64);
            labels.push(0u8);
        }

        for i in 0..5 {
            data.push(10.0 + (i % 3) as f64);
            data.push(10.0 + (i / 3) as f64);
            labels.push(1u8);
        }

        let x = Array2::from_shape_vec((35, 2), data).unwrap();
        let y = Array1::from_vec(labels);

        (x, y)
    }

    #[test]
    fn test_balances_positive_minority() {
        let (x, y) = create_imbalanced_data();

        let mut sampler = MinorityOverSampler::new().with_seed(42);
        let result = sampler.fit_resample(&x, &y).unwrap();

        assert_eq!(result.n_added, 25);
        assert_eq!(result.x.nrows(), 60);

        let counts = class_counts(&result.y);
        assert_eq!(counts[&0], counts[&1]);
    }

    #[test]
    fn test_original_rows_kept_in_order() {
        let (x, y) = create_imbalanced_data();
        let mut sampler = MinorityOverSampler::new().with_seed(1);
        let result = sampler.fit_resample(&x, &y).unwrap();

        for i in 0..x.nrows() {
            assert_eq!(result.x.row(i), x.row(i));
            assert_eq!(result.y[i], y[i]);
        }
    }

    #[test]
    fn test_appended_rows_are_copies_of_positives() {
        let (x, y) = create_imbalanced_data();
        let mut sampler = MinorityOverSampler::new().with_seed(7);
        let result = sampler.fit_resample(&x, &y).unwrap();

        let positives: Vec<Vec<f64>> = (30..35).map(|i| x.row(i).to_vec()).collect();
        for i in x.nrows()..result.x.nrows() {
            assert_eq!(result.y[i], 1);
            assert!(positives.contains(&result.x.row(i).to_vec()));
        }
    }

    #[test]
    fn test_positive_majority_unchanged() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = Array1::from_vec(vec![1u8, 1, 1, 0]);

        let mut sampler = MinorityOverSampler::new().with_seed(42);
        let result = sampler.fit_resample(&x, &y).unwrap();

        assert_eq!(result.n_added, 0);
        assert_eq!(result.x, x);
        assert_eq!(result.y, y);
    }

    #[test]
    fn test_same_seed_same_result() {
        let (x, y) = create_imbalanced_data();
        let a = MinorityOverSampler::new().with_seed(3).fit_resample(&x, &y).unwrap();
        let b = MinorityOverSampler::new().with_seed(3).fit_resample(&x, &y).unwrap();
        assert_eq!(a.x, b.x);
    }

    #[test]
    fn test_no_positives_is_an_error() {
        let x = Array2::from_shape_vec((3, 1), vec![1.0, 2.0, 3.0]).unwrap();
        let y = Array1::from_vec(vec![0u8, 0, 0]);
        let err = MinorityOverSampler::new().fit_resample(&x, &y).unwrap_err();
        assert!(matches!(err, StressError::Preprocessing(_)));
    }

    #[test]
    fn test_resample_before_fit() {
        let (x, y) = create_imbalanced_data();
        assert!(MinorityOverSampler::new().resample(&x, &y).is_err());
    }
}

//! Train / test splitting

use crate::error::{Result, StressError};
use crate::synthetic::class_indices;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A single train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Rows selected by a [`SplitIndices`]
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: Array2<f64>,
    pub y_train: Array1<u8>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<u8>,
}

impl SplitIndices {
    /// Materialize the split on a matrix and label vector
    pub fn apply(&self, x: &Array2<f64>, y: &Array1<u8>) -> SplitData {
        SplitData {
            x_train: x.select(Axis(0), &self.train_indices),
            y_train: self.train_indices.iter().map(|&i| y[i]).collect(),
            x_test: x.select(Axis(0), &self.test_indices),
            y_test: self.test_indices.iter().map(|&i| y[i]).collect(),
        }
    }
}

fn n_test_rows(n_samples: usize, test_fraction: f64) -> Result<usize> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(StressError::Validation(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    let n_test = (n_samples as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(StressError::Validation(format!(
            "cannot split {} rows with test fraction {}",
            n_samples, test_fraction
        )));
    }
    Ok(n_test)
}

/// Shuffle the rows with `seed` and hold out `ceil(n * test_fraction)` of them
pub fn train_test_split(n_samples: usize, test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    let n_test = n_test_rows(n_samples, test_fraction)?;

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    Ok(SplitIndices {
        train_indices,
        test_indices: indices,
    })
}

/// Split that keeps the class proportions of `y` in both parts.
///
/// Each class contributes `round(count * test_fraction)` rows to the test
/// part, at least one when the class has two or more rows.
pub fn stratified_split(y: &Array1<u8>, test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    n_test_rows(y.len(), test_fraction)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for (class, mut members) in class_indices(y) {
        if members.len() < 2 {
            return Err(StressError::Validation(format!(
                "class {} has {} row(s); stratified split needs at least 2",
                class,
                members.len()
            )));
        }
        members.shuffle(&mut rng);
        let n_test = ((members.len() as f64 * test_fraction).round() as usize)
            .clamp(1, members.len() - 1);
        let train = members.split_off(n_test);
        test_indices.extend(members);
        train_indices.extend(train);
    }

    train_indices.shuffle(&mut rng);
    test_indices.shuffle(&mut rng);

    Ok(SplitIndices {
        train_indices,
        test_indices,
    })
}

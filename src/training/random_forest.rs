//! Random forest classifier

use super::config::HyperParams;
use super::decision_tree::{DecisionTree, N_CLASSES};
use crate::error::{Result, StressError};
use crate::synthetic::class_counts;
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-class sample weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample weighs 1
    Uniform,
    /// `n_samples / (n_classes * count(class))`, computed on the fit data
    Balanced,
}

/// Bagged ensemble of [`DecisionTree`]s with averaged leaf probabilities.
/// Each tree fits a bootstrap sample and considers `floor(sqrt(n_features))`
/// features per split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    pub class_weight: ClassWeight,
    /// Seed of tree `i` is `random_state + i`
    pub random_state: u64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestClassifier {
    /// Create a new forest
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            class_weight: ClassWeight::Uniform,
            random_state: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Balanced forest configured from a grid entry
    pub fn from_params(params: &HyperParams, random_state: u64) -> Self {
        Self::new(params.n_estimators)
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split)
            .with_class_weight(ClassWeight::Balanced)
            .with_random_state(random_state)
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn compute_max_features(n_features: usize) -> usize {
        ((n_features as f64).sqrt().floor() as usize).max(1)
    }

    fn sample_weights(&self, y: &Array1<u8>) -> [f64; N_CLASSES] {
        match self.class_weight {
            ClassWeight::Uniform => [1.0; N_CLASSES],
            ClassWeight::Balanced => {
                let counts = class_counts(y);
                let n = y.len() as f64;
                let k = counts.len() as f64;
                let mut weights = [1.0; N_CLASSES];
                for (&class, &count) in &counts {
                    weights[usize::from(class)] = n / (k * count as f64);
                }
                weights
            }
        }
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(StressError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(StressError::Training("cannot fit a forest on zero rows".to_string()));
        }
        if self.n_estimators == 0 {
            return Err(StressError::Training("n_estimators must be at least 1".to_string()));
        }
        if let Some(bad) = y.iter().find(|&&c| usize::from(c) >= N_CLASSES) {
            return Err(StressError::Training(format!("label {} is not binary", bad)));
        }

        self.n_features = n_features;
        let max_features = Self::compute_max_features(n_features);
        let class_weights = self.sample_weights(y);
        let base_seed = self.random_state;

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let x_boot = x.select(ndarray::Axis(0), &sample_indices);
                let y_boot: Vec<u8> = sample_indices.iter().map(|&i| y[i]).collect();
                let w_boot: Vec<f64> = y_boot
                    .iter()
                    .map(|&c| class_weights[usize::from(c)])
                    .collect();

                let mut tree = DecisionTree::new()
                    .with_max_depth(self.max_depth)
                    .with_min_samples_split(self.min_samples_split)
                    .with_max_features(max_features);
                tree.fit_weighted(&x_boot, &y_boot, &w_boot, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                let tree_total: f64 = imp.sum();
                if tree_total <= 0.0 {
                    continue;
                }
                for (i, &val) in imp.iter().enumerate() {
                    total_importances[i] += val / tree_total;
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Mean of the trees' leaf distributions; shape `(n_rows, 2)`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(StressError::ModelNotFitted);
        }

        let per_tree: Vec<Array2<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<Vec<_>>>()?;

        let mut proba = Array2::zeros((x.nrows(), N_CLASSES));
        for p in &per_tree {
            proba += p;
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }

    /// Most probable class per row (class 0 on ties)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|p| u8::from(p[1] > p[0]))
            .collect())
    }

    /// Normalized mean impurity decrease per feature; sums to 1 unless no
    /// tree ever split
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> (Array2<f64>, Array1<u8>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [0.3, 0.1],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
            [1.3, 1.0],
        ];
        let y = array![0u8, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_classifier() {
        let (x, y) = two_blobs();
        let mut rf = RandomForestClassifier::new(20).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let correct = predictions.iter().zip(y.iter()).filter(|(p, a)| p == a).count();
        assert!(correct as f64 / y.len() as f64 >= 0.8);
        assert_eq!(rf.n_trees(), 20);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = two_blobs();
        let mut rf = RandomForestClassifier::new(15).with_class_weight(ClassWeight::Balanced);
        rf.fit(&x, &y).unwrap();

        let proba = rf.predict_proba(&array![[0.5, 0.5], [5.0, -3.0], [0.0, 0.0]]).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = two_blobs();
        let mut rf = RandomForestClassifier::new(10);
        rf.fit(&x, &y).unwrap();

        let imp = rf.feature_importances().unwrap();
        assert_eq!(imp.len(), 2);
        assert!((imp.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = two_blobs();
        let grid = HyperParams::new(12, Some(3), 2);

        let mut a = RandomForestClassifier::from_params(&grid, 42);
        let mut b = RandomForestClassifier::from_params(&grid, 42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let rows = array![[0.6, 0.4], [0.9, 0.2]];
        assert_eq!(a.predict_proba(&rows).unwrap(), b.predict_proba(&rows).unwrap());
    }

    #[test]
    fn test_balanced_weights() {
        let rf = RandomForestClassifier::new(1).with_class_weight(ClassWeight::Balanced);
        let w = rf.sample_weights(&array![0u8, 0, 0, 1]);
        assert!((w[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((w[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sqrt_max_features() {
        assert_eq!(RandomForestClassifier::compute_max_features(9), 3);
        assert_eq!(RandomForestClassifier::compute_max_features(8), 2);
        assert_eq!(RandomForestClassifier::compute_max_features(1), 1);
    }

    #[test]
    fn test_not_fitted() {
        let rf = RandomForestClassifier::new(5);
        assert!(matches!(rf.predict(&array![[1.0, 2.0]]), Err(StressError::ModelNotFitted)));
    }
}

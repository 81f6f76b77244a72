//! Weighted CART classification tree

use crate::error::{Result, StressError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of label classes (0 = not stressed, 1 = stressed)
pub const N_CLASSES: usize = 2;

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with the weighted class distribution of its samples
    Leaf {
        proba: [f64; N_CLASSES],
        n_samples: usize,
    },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Binary classification tree grown on gini impurity with per-sample weights.
///
/// At every node features are visited in random order and the search stops
/// after `max_features` of them that are not constant within the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth (`None` = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Features considered per split (`None` = all)
    pub max_features: Option<usize>,
    n_features: usize,
    /// Unnormalized weighted impurity decrease per feature
    importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows reaching a node, with their labels and weights
struct NodeSamples<'a> {
    x: &'a Array2<f64>,
    y: &'a [u8],
    w: &'a [f64],
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            n_features: 0,
            importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set number of features searched per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Fit the tree with per-sample weights, drawing feature subsets from `rng`
    pub fn fit_weighted<R: Rng>(
        &mut self,
        x: &Array2<f64>,
        y: &[u8],
        weights: &[f64],
        rng: &mut R,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() || n_samples != weights.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} labels and weights", n_samples),
                actual: format!("{} labels, {} weights", y.len(), weights.len()),
            });
        }
        if n_samples == 0 {
            return Err(StressError::Training("cannot fit a tree on zero rows".to_string()));
        }
        if let Some(bad) = y.iter().find(|&&c| usize::from(c) >= N_CLASSES) {
            return Err(StressError::Training(format!("label {} is not binary", bad)));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let samples = NodeSamples { x, y, w: weights };
        let indices: Vec<usize> = (0..n_samples).collect();

        self.root = Some(self.build_tree(&samples, indices, 0, &mut importances, rng));
        self.importances = Some(Array1::from_vec(importances));
        Ok(self)
    }

    /// Fit with unit weights
    pub fn fit<R: Rng>(&mut self, x: &Array2<f64>, y: &[u8], rng: &mut R) -> Result<&mut Self> {
        let weights = vec![1.0; y.len()];
        self.fit_weighted(x, y, &weights, rng)
    }

    fn build_tree<R: Rng>(
        &self,
        samples: &NodeSamples<'_>,
        indices: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
        rng: &mut R,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = class_weights(samples, &indices);
        let impurity = gini(&counts);

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= f64::EPSILON;

        if should_stop {
            return leaf(counts, n_samples);
        }

        let Some(split) = self.find_best_split(samples, &indices, &counts, rng) else {
            return leaf(counts, n_samples);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| samples.x[[i, split.feature]] <= split.threshold);

        importances[split.feature] += split.decrease;

        let left = Box::new(self.build_tree(samples, left_idx, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(samples, right_idx, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn find_best_split<R: Rng>(
        &self,
        samples: &NodeSamples<'_>,
        indices: &[usize],
        parent: &[f64; N_CLASSES],
        rng: &mut R,
    ) -> Option<BestSplit> {
        let n_try = self.max_features.unwrap_or(self.n_features).min(self.n_features);
        let features = index::sample(rng, self.n_features, self.n_features);

        let parent_total: f64 = parent.iter().sum();
        let parent_term = parent_total * gini(parent);
        let mut best: Option<BestSplit> = None;

        // Features constant within the node do not count towards `n_try`
        let mut visited = 0;
        let mut order = indices.to_vec();
        for feature in features.iter() {
            if visited >= n_try {
                break;
            }
            order.sort_by(|&a, &b| {
                samples.x[[a, feature]]
                    .partial_cmp(&samples.x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let (Some(&lo), Some(&hi)) = (order.first(), order.last()) else {
                return None;
            };
            if samples.x[[hi, feature]] <= samples.x[[lo, feature]] {
                continue;
            }
            visited += 1;

            let mut left = [0.0; N_CLASSES];
            for pos in 0..order.len() - 1 {
                let i = order[pos];
                left[usize::from(samples.y[i])] += samples.w[i];

                let here = samples.x[[i, feature]];
                let next = samples.x[[order[pos + 1], feature]];
                if next <= here {
                    continue;
                }

                let right = [parent[0] - left[0], parent[1] - left[1]];
                let left_total: f64 = left.iter().sum();
                let right_total: f64 = right.iter().sum();
                let decrease =
                    parent_term - left_total * gini(&left) - right_total * gini(&right);

                if decrease > best.as_ref().map_or(1e-12, |b| b.decrease) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        decrease,
                    });
                }
            }
        }

        best
    }

    /// Class probabilities for every row of `x`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let root = self.root.as_ref().ok_or(StressError::ModelNotFitted)?;
        self.check_width(x)?;

        let mut proba = Array2::zeros((x.nrows(), N_CLASSES));
        for (i, row) in x.rows().into_iter().enumerate() {
            let p = descend(root, row);
            proba[[i, 0]] = p[0];
            proba[[i, 1]] = p[1];
        }
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

    /// Raw weighted impurity decrease per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.importances.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Depth of the fitted tree (a lone leaf has depth 0)
    pub fn depth(&self) -> usize {
        fn depth_of(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        self.root.as_ref().map_or(0, depth_of)
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(StressError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

fn class_weights(samples: &NodeSamples<'_>, indices: &[usize]) -> [f64; N_CLASSES] {
    let mut counts = [0.0; N_CLASSES];
    for &i in indices {
        counts[usize::from(samples.y[i])] += samples.w[i];
    }
    counts
}

fn gini(counts: &[f64; N_CLASSES]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

fn leaf(counts: [f64; N_CLASSES], n_samples: usize) -> TreeNode {
    let total: f64 = counts.iter().sum();
    let proba = if total > 0.0 {
        [counts[0] / total, counts[1] / total]
    } else {
        [1.0, 0.0]
    };
    TreeNode::Leaf { proba, n_samples }
}

fn descend(mut node: &TreeNode, row: ArrayView1<'_, f64>) -> [f64; N_CLASSES] {
    loop {
        match node {
            TreeNode::Leaf { proba, .. } => return *proba,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                node = if row[*feature_idx] <= *threshold { left } else { right };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_separable_data() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 1.0], [10.0, 1.0], [11.0, 0.0], [12.0, 1.0]];
        let y = [0u8, 0, 0, 1, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &mut rng).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
        assert!(tree.depth() >= 1);
    }

    #[test]
    fn test_max_depth_zero_is_a_single_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0u8, 1, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut tree = DecisionTree::new().with_max_depth(Some(0));
        tree.fit(&x, &y, &mut rng).unwrap();

        assert_eq!(tree.depth(), 0);
        let proba = tree.predict_proba(&array![[100.0]]).unwrap();
        assert!((proba[[0, 1]] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_weights_shift_leaf_distribution() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = [0u8, 0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut tree = DecisionTree::new();
        tree.fit_weighted(&x, &y, &[1.0, 1.0, 2.0], &mut rng).unwrap();

        let proba = tree.predict_proba(&array![[1.0]]).unwrap();
        assert!((proba[[0, 0]] - 0.5).abs() < 1e-12);
        assert!((proba[[0, 1]] - 0.5).abs() < 1e-12);
        assert_eq!(tree.predict(&array![[1.0]]).unwrap()[0], 0);
    }

    #[test]
    fn test_importance_goes_to_informative_feature() {
        let x = array![[0.0, 5.0], [0.0, 1.0], [1.0, 5.0], [1.0, 1.0], [0.0, 3.0], [1.0, 3.0]];
        let y = [0u8, 0, 1, 1, 0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &mut rng).unwrap();

        let imp = tree.feature_importances().unwrap();
        assert!(imp[0] > 0.0);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn test_errors() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = DecisionTree::new();
        assert!(matches!(tree.predict(&array![[1.0]]), Err(StressError::ModelNotFitted)));

        let mut tree = DecisionTree::new();
        assert!(tree.fit(&array![[1.0], [2.0]], &[0u8], &mut rng).is_err());
        assert!(tree.fit(&array![[1.0]], &[3u8], &mut rng).is_err());

        tree.fit(&array![[1.0, 2.0], [2.0, 1.0]], &[0u8, 1], &mut rng).unwrap();
        assert!(tree.predict(&array![[1.0]]).is_err());
    }
}

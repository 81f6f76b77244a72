//! Training configuration

use crate::error::{Result, StressError};
use serde::{Deserialize, Serialize};

/// Forest hyperparameters evaluated by model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth (`None` = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
}

impl HyperParams {
    pub fn new(n_estimators: usize, max_depth: Option<usize>, min_samples_split: usize) -> Self {
        Self {
            n_estimators,
            max_depth,
            min_samples_split,
        }
    }

    /// The fixed four-entry search grid
    pub fn default_grid() -> Vec<HyperParams> {
        vec![
            HyperParams::new(100, Some(10), 2),
            HyperParams::new(200, Some(15), 5),
            HyperParams::new(300, Some(20), 10),
            HyperParams::new(100, None, 2),
        ]
    }
}

impl std::fmt::Display for HyperParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let depth = self
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}",
            self.n_estimators, depth, self.min_samples_split
        )
    }
}

/// Configuration for hyperparameter selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Candidate grid, evaluated in order
    pub grid: Vec<HyperParams>,

    /// Random train/validation splits per candidate
    pub n_repeats: usize,

    /// Fraction of rows held out for validation in each repetition
    pub validation_split: f64,

    /// Seed for the split generator (`None` = fresh entropy each run)
    pub split_seed: Option<u64>,

    /// Seed given to every forest
    pub forest_random_state: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            grid: HyperParams::default_grid(),
            n_repeats: 5,
            validation_split: 0.2,
            split_seed: None,
            forest_random_state: 42,
        }
    }
}

impl SelectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to replace the candidate grid
    pub fn with_grid(mut self, grid: Vec<HyperParams>) -> Self {
        self.grid = grid;
        self
    }

    /// Builder method to set the number of repetitions
    pub fn with_n_repeats(mut self, n_repeats: usize) -> Self {
        self.n_repeats = n_repeats;
        self
    }

    /// Builder method to fix the split generator seed
    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.is_empty() {
            return Err(StressError::Config("selection grid is empty".to_string()));
        }
        if self.n_repeats == 0 {
            return Err(StressError::Config("n_repeats must be at least 1".to_string()));
        }
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(StressError::Config(format!(
                "validation_split must be in (0, 1), got {}",
                self.validation_split
            )));
        }
        if let Some(bad) = self.grid.iter().find(|p| p.n_estimators == 0 || p.min_samples_split < 2) {
            return Err(StressError::Config(format!("invalid grid entry: {}", bad)));
        }
        Ok(())
    }
}

/// Configuration for the end-to-end training run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of prepared rows held out for the final evaluation
    pub test_split: f64,

    /// Seed for the stratified hold-out split
    pub test_split_seed: u64,

    /// Seed for minority oversampling (`None` = fresh entropy)
    pub oversample_seed: Option<u64>,

    /// Hyperparameter selection settings
    pub selection: SelectionConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_split: 0.2,
            test_split_seed: 42,
            oversample_seed: None,
            selection: SelectionConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the selection settings
    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Fix every seed in the run, making training fully reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.oversample_seed = Some(seed);
        self.selection.split_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_split > 0.0 && self.test_split < 1.0) {
            return Err(StressError::Config(format!(
                "test_split must be in (0, 1), got {}",
                self.test_split
            )));
        }
        self.selection.validate()
    }
}

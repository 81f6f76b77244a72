//! Hyperparameter selection over a fixed grid

use super::config::{HyperParams, SelectionConfig};
use super::metrics::weighted_f1;
use super::random_forest::RandomForestClassifier;
use super::split::train_test_split;
use crate::error::{Result, StressError};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Score of one grid entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: HyperParams,
    /// Validation weighted F1 of each repetition
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    /// Split seed used by each repetition
    pub split_seeds: Vec<u64>,
}

/// Result of [`ModelSelector::select_and_fit`]
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    /// Winner refit on all rows given to the selector
    pub classifier: RandomForestClassifier,
    pub best: HyperParams,
    pub best_score: f64,
    /// Scores in grid order
    pub candidate_scores: Vec<CandidateScore>,
}

/// Repeated random-split grid search for the forest.
///
/// Every candidate gets `n_repeats` random splits. Split seeds are drawn in
/// `0..1000` from one generator, candidate by candidate, before any forest is
/// fit, so running candidates in parallel leaves the outcome unchanged.
#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    config: SelectionConfig,
}

impl ModelSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Draw the split seeds for every (candidate, repetition) pair
    fn draw_split_seeds(&self) -> Vec<Vec<u64>> {
        let mut rng = match self.config.split_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.config
            .grid
            .iter()
            .map(|_| {
                (0..self.config.n_repeats)
                    .map(|_| rng.gen_range(0..1000u64))
                    .collect()
            })
            .collect()
    }

    fn evaluate(
        &self,
        params: &HyperParams,
        seeds: &[u64],
        x: &Array2<f64>,
        y: &Array1<u8>,
    ) -> Result<CandidateScore> {
        let fold_scores = seeds
            .iter()
            .map(|&seed| {
                let data = train_test_split(x.nrows(), self.config.validation_split, seed)?
                    .apply(x, y);
                let mut forest =
                    RandomForestClassifier::from_params(params, self.config.forest_random_state);
                forest.fit(&data.x_train, &data.y_train)?;
                let predicted = forest.predict(&data.x_test)?;
                Ok(weighted_f1(&data.y_test.to_vec(), &predicted.to_vec()))
            })
            .collect::<Result<Vec<f64>>>()?;

        let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
        debug!(params = %params, scores = ?fold_scores, "Evaluated candidate");

        Ok(CandidateScore {
            params: *params,
            fold_scores,
            mean_score,
            split_seeds: seeds.to_vec(),
        })
    }

    /// Score the grid, pick the best entry, and refit it on `(x, y)`
    pub fn select_and_fit(&self, x: &Array2<f64>, y: &Array1<u8>) -> Result<SelectionOutcome> {
        self.config.validate()?;
        if x.nrows() != y.len() {
            return Err(StressError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let start = Instant::now();
        let seeds = self.draw_split_seeds();

        let candidate_scores: Vec<CandidateScore> = self
            .config
            .grid
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(params, seeds)| self.evaluate(params, seeds, x, y))
            .collect::<Result<Vec<_>>>()?;

        for candidate in &candidate_scores {
            info!(params = %candidate.params, mean_f1 = candidate.mean_score, "Candidate score");
        }
        let best_idx = first_best(&candidate_scores);

        let best = candidate_scores[best_idx].params;
        let best_score = candidate_scores[best_idx].mean_score;

        let mut classifier = RandomForestClassifier::from_params(&best, self.config.forest_random_state);
        classifier.fit(x, y)?;

        info!(
            best = %best,
            score = best_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Selected hyperparameters"
        );

        Ok(SelectionOutcome {
            classifier,
            best,
            best_score,
            candidate_scores,
        })
    }
}

/// Index of the first candidate with the strictly greatest mean score
fn first_best(scores: &[CandidateScore]) -> usize {
    let mut best_idx = 0;
    for (i, candidate) in scores.iter().enumerate() {
        if candidate.mean_score > scores[best_idx].mean_score {
            best_idx = i;
        }
    }
    best_idx
}

//! Model training
//!
//! A class-weighted random forest ([`RandomForestClassifier`]) built from
//! gini trees, scored with weighted F1 over repeated random splits
//! ([`ModelSelector`]) and driven end to end by [`Trainer`].

mod config;
pub mod decision_tree;
pub mod metrics;
pub mod random_forest;
pub mod selector;
pub mod split;
mod trainer;

pub use config::{HyperParams, SelectionConfig, TrainingConfig};
pub use decision_tree::{DecisionTree, TreeNode};
pub use metrics::{weighted_f1, ClassMetrics, ModelMetrics};
pub use random_forest::{ClassWeight, RandomForestClassifier};
pub use selector::{CandidateScore, ModelSelector, SelectionOutcome};
pub use split::{stratified_split, train_test_split, SplitData, SplitIndices};
pub use trainer::{TrainedClassifier, Trainer, TrainingMetadata, TrainingRun};

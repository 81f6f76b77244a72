//! Classification metrics

use super::decision_tree::N_CLASSES;
use serde::{Deserialize, Serialize};

/// Precision / recall / F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of true samples of this class
    pub support: usize,
}

/// Metrics for model evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    /// Support-weighted mean of per-class F1
    pub weighted_f1: f64,
    pub macro_f1: f64,
    /// Per-class breakdown, classes 0 and 1
    pub per_class: Vec<ClassMetrics>,
    /// `confusion[true][predicted]`
    pub confusion: [[usize; N_CLASSES]; N_CLASSES],
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Compute classification metrics
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Self {
        let confusion = confusion_matrix(y_true, y_pred);
        let n_samples = y_true.len().min(y_pred.len());

        let correct: usize = (0..N_CLASSES).map(|c| confusion[c][c]).sum();
        let accuracy = ratio(correct, n_samples);

        let per_class: Vec<ClassMetrics> = (0..N_CLASSES)
            .map(|c| {
                let tp = confusion[c][c];
                let predicted: usize = (0..N_CLASSES).map(|t| confusion[t][c]).sum();
                let support: usize = confusion[c].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1_score = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    class: c as u8,
                    precision,
                    recall,
                    f1_score,
                    support,
                }
            })
            .collect();

        let weighted_f1 = if n_samples > 0 {
            per_class
                .iter()
                .map(|m| m.f1_score * m.support as f64)
                .sum::<f64>()
                / n_samples as f64
        } else {
            0.0
        };

        let present: Vec<&ClassMetrics> = per_class
            .iter()
            .enumerate()
            .filter(|(c, m)| m.support > 0 || (0..N_CLASSES).any(|t| confusion[t][*c] > 0))
            .map(|(_, m)| m)
            .collect();
        let macro_f1 = if present.is_empty() {
            0.0
        } else {
            present.iter().map(|m| m.f1_score).sum::<f64>() / present.len() as f64
        };

        Self {
            accuracy,
            weighted_f1,
            macro_f1,
            per_class,
            confusion,
            n_samples,
        }
    }

    /// Plain-text report in the usual precision / recall / f1 / support layout
    pub fn report(&self) -> String {
        let mut out = format!(
            "{:>12} {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for m in &self.per_class {
            out.push_str(&format!(
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
                m.class, m.precision, m.recall, m.f1_score, m.support
            ));
        }
        out.push_str(&format!(
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}\n",
            "accuracy", "", "", self.accuracy, self.n_samples
        ));
        out.push_str(&format!(
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}\n",
            "weighted f1", "", "", self.weighted_f1, self.n_samples
        ));
        out
    }
}

/// Weighted F1 score, the model selection objective
pub fn weighted_f1(y_true: &[u8], y_pred: &[u8]) -> f64 {
    ModelMetrics::compute(y_true, y_pred).weighted_f1
}

/// `matrix[true][predicted]` counts; labels outside 0..2 are ignored
pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> [[usize; N_CLASSES]; N_CLASSES] {
    let mut matrix = [[0usize; N_CLASSES]; N_CLASSES];
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        let (t, p) = (usize::from(t), usize::from(p));
        if t < N_CLASSES && p < N_CLASSES {
            matrix[t][p] += 1;
        }
    }
    matrix
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = [0u8, 1, 1, 0, 1];
        let metrics = ModelMetrics::compute(&y, &y);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.weighted_f1, 1.0);
        assert_eq!(metrics.confusion, [[2, 0], [0, 3]]);
    }

    #[test]
    fn test_weighted_f1_hand_computed() {
        // class 0: tp 3, fp 1, fn 1 -> p 0.75, r 0.75, f1 0.75, support 4
        // class 1: tp 1, fp 1, fn 1 -> p 0.5,  r 0.5,  f1 0.5,  support 2
        let y_true = [0u8, 0, 0, 0, 1, 1];
        let y_pred = [0u8, 0, 0, 1, 0, 1];
        let metrics = ModelMetrics::compute(&y_true, &y_pred);

        let expected = (0.75 * 4.0 + 0.5 * 2.0) / 6.0;
        assert!((metrics.weighted_f1 - expected).abs() < 1e-12);
        assert!((metrics.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((metrics.macro_f1 - 0.625).abs() < 1e-12);
        assert_eq!(metrics.per_class[1].support, 2);
    }

    #[test]
    fn test_single_class_truth() {
        let metrics = ModelMetrics::compute(&[1, 1, 1], &[1, 0, 1]);
        assert!((metrics.weighted_f1 - 0.8).abs() < 1e-12);
        assert_eq!(metrics.per_class[0].support, 0);
    }

    #[test]
    fn test_empty_input() {
        let metrics = ModelMetrics::compute(&[], &[]);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.weighted_f1, 0.0);
    }

    #[test]
    fn test_report_layout() {
        let report = ModelMetrics::compute(&[0, 1], &[0, 1]).report();
        assert!(report.contains("precision"));
        assert!(report.contains("accuracy"));
        assert_eq!(report.lines().count(), 5);
    }
}

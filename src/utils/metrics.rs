//! Metrics Module for Model Evaluation
//!
//! Accuracy, loss and a confusion matrix for the held-out split.

use serde::{Deserialize, Serialize};

/// Result of scoring a model on the evaluation split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Mean categorical cross-entropy over all samples
    pub loss: f64,
    /// Fraction of samples classified correctly
    pub accuracy: f64,
    /// Number of samples evaluated
    pub total_samples: usize,
    /// Number of correct predictions
    pub correct_predictions: usize,
    /// Confusion matrix (rows: actual, columns: predicted)
    pub confusion_matrix: ConfusionMatrix,
}

impl EvaluationReport {
    /// Build a report from a filled confusion matrix and the summed per-sample loss
    pub fn new(confusion_matrix: ConfusionMatrix, loss_sum: f64) -> Self {
        let total_samples = confusion_matrix.total();
        let correct_predictions = confusion_matrix.correct();
        let loss = if total_samples == 0 {
            0.0
        } else {
            loss_sum / total_samples as f64
        };

        Self {
            loss,
            accuracy: confusion_matrix.accuracy(),
            total_samples,
            correct_predictions,
            confusion_matrix,
        }
    }
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} samples - loss: {:.4} - accuracy: {:.4}",
            self.total_samples, self.loss, self.accuracy
        )
    }
}

/// Confusion matrix for multi-class classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// `matrix[actual][predicted]`
    pub matrix: Vec<Vec<usize>>,
    pub num_classes: usize,
}

impl ConfusionMatrix {
    /// Create an empty confusion matrix
    pub fn new(num_classes: usize) -> Self {
        Self {
            matrix: vec![vec![0; num_classes]; num_classes],
            num_classes,
        }
    }

    /// Create from predictions and ground truth
    pub fn from_predictions(predictions: &[usize], ground_truth: &[usize], num_classes: usize) -> Self {
        let mut cm = Self::new(num_classes);
        for (&pred, &actual) in predictions.iter().zip(ground_truth.iter()) {
            cm.add(actual, pred);
        }
        cm
    }

    /// Record one prediction; out-of-range indices are ignored
    pub fn add(&mut self, actual: usize, predicted: usize) {
        if actual < self.num_classes && predicted < self.num_classes {
            self.matrix[actual][predicted] += 1;
        }
    }

    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.matrix
            .get(actual)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Total number of recorded predictions
    pub fn total(&self) -> usize {
        self.matrix.iter().map(|row| row.iter().sum::<usize>()).sum()
    }

    /// Number of correct predictions (diagonal)
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|i| self.matrix[i][i]).sum()
    }

    /// Overall accuracy
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.correct() as f64 / total as f64
        }
    }

    /// Per-class recall; `None` for classes with no samples
    pub fn recall(&self, class_idx: usize) -> Option<f64> {
        let row = self.matrix.get(class_idx)?;
        let support: usize = row.iter().sum();
        if support == 0 {
            None
        } else {
            Some(row[class_idx] as f64 / support as f64)
        }
    }
}

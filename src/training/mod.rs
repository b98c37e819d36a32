//! Training module
//!
//! - `loss`: categorical cross-entropy on one-hot targets
//! - `supervised`: training loop, evaluation and the end-to-end pipeline

pub mod loss;
pub mod supervised;

pub use loss::categorical_cross_entropy;
pub use supervised::{evaluate, fit, run_training, EpochSummary, TrainingOutcome};

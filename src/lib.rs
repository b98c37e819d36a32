//! # Traffic Signs
//!
//! Trains a convolutional classifier on a directory of traffic-sign photographs
//! and reports its accuracy on a held-out split. Built on the Burn framework.
//!
//! ## Modules
//!
//! - `dataset`: Category directory scanning, image decoding, train/test split and Burn batching
//! - `model`: The CNN architecture and model file persistence
//! - `training`: Training loop, evaluation and the end-to-end pipeline
//! - `utils`: Logging, metrics and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use traffic_signs::{backend::TrainingBackend, RunConfig};
//! use traffic_signs::training::run_training;
//!
//! let config = RunConfig::default();
//! let outcome = run_training::<TrainingBackend>("gtsrb".as_ref(), None, &config)?;
//! println!("accuracy: {:.4}", outcome.report.accuracy);
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

pub use config::RunConfig;
pub use dataset::loader::{load_data, scan_categories, LoadedDataset, Sample};
pub use dataset::split::{split_samples, DatasetSplit};
pub use dataset::{TrafficSignBatch, TrafficSignBatcher, TrafficSignDataset, TrafficSignItem};
pub use model::cnn::{TrafficNet, TrafficNetConfig};
pub use training::{run_training, TrainingOutcome};
pub use utils::error::{Result, TrafficError};
pub use utils::metrics::{ConfusionMatrix, EvaluationReport};

/// Number of passes over the training split
pub const EPOCHS: usize = 10;

/// Width every image is resized to
pub const IMG_WIDTH: u32 = 30;

/// Height every image is resized to
pub const IMG_HEIGHT: u32 = 30;

/// Number of traffic sign categories (GTSRB)
pub const NUM_CATEGORIES: usize = 43;

/// Fraction of samples held out for evaluation
pub const TEST_SIZE: f64 = 0.4;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

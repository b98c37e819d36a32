//! Dataset module for traffic sign data handling
//!
//! This module provides functionality for:
//! - Scanning numeric category directories and decoding their images
//! - Randomly splitting samples into training and evaluation subsets
//! - Feeding samples to Burn as batched tensors

pub mod burn_dataset;
pub mod loader;
pub mod split;

pub use burn_dataset::{
    one_hot, TrafficSignBatch, TrafficSignBatcher, TrafficSignDataset, TrafficSignItem,
};
pub use loader::{load_data, scan_categories, CategoryDir, DatasetStats, LoadedDataset, Sample};
pub use split::{split_samples, DatasetSplit};

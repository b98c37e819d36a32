//! Error Handling Module
//!
//! Defines the error type shared by the dataset, model and training modules.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for traffic sign classification
#[derive(Error, Debug)]
pub enum TrafficError {
    /// Error decoding or resizing an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error with model construction or persistence
    #[error("Model error: {0}")]
    Model(String),

    /// Error with training
    #[error("Training error: {0}")]
    Training(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Convenience Result type
pub type Result<T> = std::result::Result<T, TrafficError>;

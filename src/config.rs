//! Run Configuration
//!
//! The tunable constants of a training run, gathered in one value that is
//! passed to loading, splitting, training and evaluation.

use serde::{Deserialize, Serialize};

use crate::model::cnn::{feature_map_size, TrafficNetConfig};
use crate::utils::error::{Result, TrafficError};
use crate::{EPOCHS, IMG_HEIGHT, IMG_WIDTH, NUM_CATEGORIES, TEST_SIZE};

/// Default mini-batch size
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default Adam learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Target image width after resizing
    pub image_width: u32,
    /// Target image height after resizing
    pub image_height: u32,
    /// Number of categories (output units)
    pub num_categories: usize,
    /// Fraction of samples held out for evaluation
    pub test_fraction: f64,
    /// Mini-batch size
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Seed for the train/test split and epoch shuffling; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            epochs: EPOCHS,
            image_width: IMG_WIDTH,
            image_height: IMG_HEIGHT,
            num_categories: NUM_CATEGORIES,
            test_fraction: TEST_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Use a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(TrafficError::Config(
                "epochs must be greater than 0".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(TrafficError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if self.num_categories == 0 {
            return Err(TrafficError::Config(
                "num_categories must be greater than 0".to_string(),
            ));
        }

        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(TrafficError::Config(format!(
                "test_fraction must be between 0.0 and 1.0 (exclusive), got {}",
                self.test_fraction
            )));
        }

        if !(self.learning_rate > 0.0) {
            return Err(TrafficError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }

        if feature_map_size(self.image_width as usize) == 0
            || feature_map_size(self.image_height as usize) == 0
        {
            return Err(TrafficError::Config(format!(
                "image size {}x{} is too small for three conv/pool blocks",
                self.image_width, self.image_height
            )));
        }

        Ok(())
    }

    /// Architecture configuration matching this run
    pub fn model_config(&self) -> TrafficNetConfig {
        TrafficNetConfig::new(
            self.num_categories,
            self.image_width as usize,
            self.image_height as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_constants() {
        let config = RunConfig::default();
        assert_eq!(config.epochs, 10);
        assert_eq!(config.image_width, 30);
        assert_eq!(config.image_height, 30);
        assert_eq!(config.num_categories, 43);
        assert!((config.test_fraction - 0.4).abs() < f64::EPSILON);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_fraction() {
        for fraction in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let config = RunConfig {
                test_fraction: fraction,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "fraction {fraction} accepted");
        }
    }

    #[test]
    fn test_rejects_tiny_images() {
        let config = RunConfig {
            image_width: 12,
            image_height: 30,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TrafficError::Config(_))));

        let config = RunConfig {
            image_width: 22,
            image_height: 22,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_epochs() {
        let config = RunConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_config() {
        let config = RunConfig {
            num_categories: 5,
            ..Default::default()
        }
        .with_seed(7);
        let model_config = config.model_config();
        assert_eq!(model_config.num_categories, 5);
        assert_eq!(model_config.input_width, 30);
        assert_eq!(model_config.input_height, 30);
        assert_eq!(config.seed, Some(7));
    }
}

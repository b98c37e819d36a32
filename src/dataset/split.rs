//! Train/test split
//!
//! Shuffle-and-slice partition of the loaded samples. The evaluation side
//! receives `ceil(test_fraction * n)` samples and the training side the rest.
//! Without a seed the shuffle draws from OS entropy, so membership differs
//! between runs while the sizes do not.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::dataset::loader::Sample;
use crate::utils::error::{Result, TrafficError};

/// Disjoint training and evaluation subsets
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Vec<Sample>,
    pub test: Vec<Sample>,
}

/// Build an RNG from an optional seed
pub fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Number of evaluation samples for `total` samples at `test_fraction`
pub fn test_split_size(total: usize, test_fraction: f64) -> usize {
    ((test_fraction * total as f64).ceil() as usize).min(total)
}

/// Randomly partition `samples` into training and evaluation subsets
pub fn split_samples(
    mut samples: Vec<Sample>,
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<DatasetSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TrafficError::Config(format!(
            "test_fraction must be between 0.0 and 1.0 (exclusive), got {}",
            test_fraction
        )));
    }

    let total = samples.len();
    if total == 0 {
        return Err(TrafficError::Dataset(
            "No samples to split; the data directory holds no readable images".to_string(),
        ));
    }

    let n_test = test_split_size(total, test_fraction);
    let n_train = total - n_test;
    if n_train == 0 {
        return Err(TrafficError::Dataset(format!(
            "With {} samples and test_fraction {}, the training split would be empty",
            total, test_fraction
        )));
    }

    let mut rng = make_rng(seed);
    samples.shuffle(&mut rng);

    let test = samples.split_off(n_train);
    let train = samples;

    info!(
        "Split {} samples: {} train / {} test",
        total,
        train.len(),
        test.len()
    );

    Ok(DatasetSplit { train, test })
}

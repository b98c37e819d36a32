//! Supervised Training Implementation
//!
//! A custom training loop over Burn's autodiff API: Adam, categorical
//! cross-entropy on one-hot targets, a fixed number of epochs with a fresh
//! shuffle each epoch. No early stopping, no learning-rate schedule and no
//! intermediate checkpoints.

use std::path::{Path, PathBuf};

use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Int, Tensor,
    },
};
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::dataset::loader::{load_data, DatasetStats};
use crate::dataset::split::{make_rng, split_samples};
use crate::dataset::{TrafficSignBatch, TrafficSignBatcher, TrafficSignDataset};
use crate::model::cnn::TrafficNet;
use crate::model::persistence::save_model;
use crate::training::loss::categorical_cross_entropy;
use crate::utils::error::{Result, TrafficError};
use crate::utils::logging::{progress_bar, TrainingLogger};
use crate::utils::metrics::{ConfusionMatrix, EvaluationReport};

/// Loss and accuracy over one epoch of training
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSummary {
    /// Zero-based epoch index
    pub epoch: usize,
    /// Mean training loss per sample
    pub loss: f64,
    /// Training accuracy
    pub accuracy: f64,
}

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub dataset_stats: DatasetStats,
    pub train_size: usize,
    pub test_size: usize,
    pub history: Vec<EpochSummary>,
    pub report: EvaluationReport,
    /// File the model was written to, when an output path was given
    pub model_path: Option<PathBuf>,
}

fn batcher_for(config: &RunConfig) -> TrafficSignBatcher {
    TrafficSignBatcher::new(
        config.image_width as usize,
        config.image_height as usize,
        config.num_categories,
    )
}

/// Predicted category per row of `logits`
fn predictions<B: Backend>(logits: Tensor<B, 2>) -> Result<Vec<usize>> {
    let [batch_size, _] = logits.dims();
    let predicted: Tensor<B, 1, Int> = logits.argmax(1).reshape([batch_size]);

    predicted
        .into_data()
        .convert::<i64>()
        .into_vec::<i64>()
        .map(|values| values.into_iter().map(|v| v as usize).collect())
        .map_err(|e| TrafficError::Training(format!("Failed to read predictions: {:?}", e)))
}

/// Train `model` on `dataset` for `config.epochs` epochs
pub fn fit<B: AutodiffBackend>(
    mut model: TrafficNet<B>,
    dataset: &TrafficSignDataset,
    config: &RunConfig,
    device: &B::Device,
) -> Result<(TrafficNet<B>, Vec<EpochSummary>)> {
    config.validate()?;
    if dataset.len() == 0 {
        return Err(TrafficError::Training(
            "Training split is empty".to_string(),
        ));
    }

    let batcher = batcher_for(config);
    let mut optimizer = AdamConfig::new().init::<B, TrafficNet<B>>();
    let mut rng = make_rng(config.seed);
    let mut logger = TrainingLogger::new(config.epochs);
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        logger.start_epoch(epoch);

        let mut indices: Vec<usize> = (0..dataset.len()).collect();
        indices.shuffle(&mut rng);
        let num_batches = indices.len().div_ceil(config.batch_size);

        let pb = progress_bar(
            num_batches as u64,
            &format!("Epoch {}/{}", epoch + 1, config.epochs),
        );

        let mut loss_sum = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;

        for chunk in indices.chunks(config.batch_size) {
            let items: Vec<_> = chunk.iter().filter_map(|&i| dataset.get(i)).collect();
            let labels: Vec<usize> = items.iter().map(|item| item.label).collect();
            let batch: TrafficSignBatch<B> = batcher.batch(items, device);

            let logits = model.forward(batch.images);
            let loss = categorical_cross_entropy(logits.clone(), batch.targets);
            let loss_value: f64 = loss.clone().into_scalar().elem();

            correct += predictions(logits)?
                .iter()
                .zip(labels.iter())
                .filter(|(p, l)| p == l)
                .count();
            loss_sum += loss_value * labels.len() as f64;
            seen += labels.len();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            pb.inc(1);
        }
        pb.finish_and_clear();

        let summary = EpochSummary {
            epoch,
            loss: loss_sum / seen.max(1) as f64,
            accuracy: correct as f64 / seen.max(1) as f64,
        };
        if !summary.loss.is_finite() {
            return Err(TrafficError::Training(format!(
                "Loss diverged at epoch {}",
                epoch + 1
            )));
        }
        logger.end_epoch(summary.loss, summary.accuracy);
        history.push(summary);
    }

    logger.log_complete();
    Ok((model, history))
}

/// Score `model` on `dataset`
pub fn evaluate<B: Backend>(
    model: &TrafficNet<B>,
    dataset: &TrafficSignDataset,
    config: &RunConfig,
    device: &B::Device,
) -> Result<EvaluationReport> {
    config.validate()?;

    let batcher = batcher_for(config);
    let mut predicted_labels = Vec::with_capacity(dataset.len());
    let mut actual_labels = Vec::with_capacity(dataset.len());
    let mut loss_sum = 0.0f64;

    let len = dataset.len();
    for start in (0..len).step_by(config.batch_size) {
        let end = (start + config.batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        let labels: Vec<usize> = items.iter().map(|item| item.label).collect();
        let batch: TrafficSignBatch<B> = batcher.batch(items, device);

        let logits = model.forward(batch.images);
        let loss: f64 = categorical_cross_entropy(logits.clone(), batch.targets)
            .into_scalar()
            .elem();
        loss_sum += loss * labels.len() as f64;

        predicted_labels.extend(predictions(logits)?);
        actual_labels.extend(labels);
    }

    let confusion =
        ConfusionMatrix::from_predictions(&predicted_labels, &actual_labels, config.num_categories);
    let report = EvaluationReport::new(confusion, loss_sum);
    debug!("Evaluation: {}", report);
    for class_idx in 0..config.num_categories {
        if let Some(recall) = report.confusion_matrix.recall(class_idx) {
            debug!("  category {:>2}: recall {:.4}", class_idx, recall);
        }
    }
    Ok(report)
}

/// Run the whole pipeline: load, split, build, train, evaluate and optionally save
pub fn run_training<B: AutodiffBackend>(
    data_dir: &Path,
    model_path: Option<&Path>,
    config: &RunConfig,
) -> Result<TrainingOutcome> {
    config.validate()?;

    let device = B::Device::default();
    debug!("Device: {:?}", device);

    let loaded = load_data(data_dir, config)?;
    let split = split_samples(loaded.samples, config.test_fraction, config.seed)?;
    let (train_size, test_size) = (split.train.len(), split.test.len());

    let train_dataset = TrafficSignDataset::from_samples(&split.train);
    let test_dataset = TrafficSignDataset::from_samples(&split.test);
    drop(split);
    debug!(
        "Training class distribution: {:?}",
        train_dataset.class_distribution(config.num_categories)
    );

    info!(
        "Training on {} samples, evaluating on {} ({} epochs, batch size {})",
        train_size, test_size, config.epochs, config.batch_size
    );

    let model = TrafficNet::<B>::new(&config.model_config(), &device);
    let (model, history) = fit(model, &train_dataset, config, &device)?;

    let model = model.valid();
    let report = evaluate(&model, &test_dataset, config, &device)?;
    info!("Test {}", report);

    let model_path = model_path
        .map(|path| save_model(&model, path))
        .transpose()?;

    Ok(TrainingOutcome {
        dataset_stats: loaded.stats,
        train_size,
        test_size,
        history,
        report,
        model_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::loader::Sample;
    use crate::model::persistence::load_model;
    use burn::backend::Autodiff;
    use burn_ndarray::NdArray;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    fn tiny_config() -> RunConfig {
        RunConfig {
            epochs: 2,
            num_categories: 2,
            batch_size: 4,
            ..Default::default()
        }
        .with_seed(3)
    }

    fn solid(label: usize, shade: u8) -> Sample {
        let color = if label == 0 {
            Rgb([shade, 0, 0])
        } else {
            Rgb([0, 0, shade])
        };
        Sample {
            image: ImageBuffer::from_pixel(30, 30, color),
            label,
        }
    }

    fn write_dataset(root: &Path, per_category: usize) {
        for label in 0..2usize {
            let dir = root.join(label.to_string());
            std::fs::create_dir_all(&dir).unwrap();
            for i in 0..per_category {
                let sample = solid(label, 150 + 10 * i as u8);
                sample.image.save(dir.join(format!("{i:05}.ppm"))).unwrap();
            }
        }
    }

    #[test]
    fn test_fit_records_every_epoch() {
        let device = Default::default();
        let config = tiny_config();
        let samples: Vec<_> = (0..6).map(|i| solid(i % 2, 200)).collect();
        let dataset = TrafficSignDataset::from_samples(&samples);

        let model = TrafficNet::<TestAutodiffBackend>::new(&config.model_config(), &device);
        let (_, history) = fit(model, &dataset, &config, &device).unwrap();

        assert_eq!(history.len(), 2);
        for (i, summary) in history.iter().enumerate() {
            assert_eq!(summary.epoch, i);
            assert!(summary.loss.is_finite());
            assert!((0.0..=1.0).contains(&summary.accuracy));
        }
    }

    #[test]
    fn test_fit_rejects_empty_dataset() {
        let device = Default::default();
        let config = tiny_config();
        let model = TrafficNet::<TestAutodiffBackend>::new(&config.model_config(), &device);
        let result = fit(model, &TrafficSignDataset::default(), &config, &device);
        assert!(matches!(result, Err(TrafficError::Training(_))));
    }

    #[test]
    fn test_fit_and_evaluate_reject_zero_batch_size() {
        let device = Default::default();
        let config = RunConfig {
            batch_size: 0,
            ..tiny_config()
        };
        let samples: Vec<_> = (0..4).map(|i| solid(i % 2, 200)).collect();
        let dataset = TrafficSignDataset::from_samples(&samples);

        let model = TrafficNet::<TestAutodiffBackend>::new(&tiny_config().model_config(), &device);
        let result = fit(model, &dataset, &config, &device);
        assert!(matches!(result, Err(TrafficError::Config(_))));

        let model = TrafficNet::<TestBackend>::new(&tiny_config().model_config(), &device);
        let result = evaluate(&model, &dataset, &config, &device);
        assert!(matches!(result, Err(TrafficError::Config(_))));
    }

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device = Default::default();
        let config = tiny_config();
        let samples: Vec<_> = (0..7).map(|i| solid(i % 2, 180)).collect();
        let dataset = TrafficSignDataset::from_samples(&samples);

        let model = TrafficNet::<TestBackend>::new(&config.model_config(), &device);
        let report = evaluate(&model, &dataset, &config, &device).unwrap();

        assert_eq!(report.total_samples, 7);
        assert!(report.correct_predictions <= 7);
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert!(report.loss.is_finite() && report.loss > 0.0);

        let cm = &report.confusion_matrix;
        let per_class: usize = (0..2).map(|c| (0..2).map(|p| cm.get(c, p)).sum::<usize>()).sum();
        assert_eq!(per_class, 7);
        assert_eq!((0..2).map(|p| cm.get(0, p)).sum::<usize>(), 4);
        assert!(cm.recall(0).is_some() && cm.recall(1).is_some());
    }

    #[test]
    fn test_run_training_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        write_dataset(&data_dir, 5);
        std::fs::create_dir_all(data_dir.join("abc")).unwrap();

        let config = tiny_config();
        let output = temp_dir.path().join("model.h5");
        let outcome =
            run_training::<TestAutodiffBackend>(&data_dir, Some(&output), &config).unwrap();

        assert_eq!(outcome.dataset_stats.total_samples, 10);
        assert_eq!(outcome.test_size, 4);
        assert_eq!(outcome.train_size, 6);
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(outcome.report.total_samples, 4);

        let saved = outcome.model_path.expect("model path");
        assert_eq!(saved, output);
        assert!(output.exists());

        let device = Default::default();
        let model = load_model::<TestBackend>(&config.model_config(), &saved, &device).unwrap();
        assert_eq!(model.num_categories(), 2);
    }

    #[test]
    fn test_run_training_without_output_path() {
        let temp_dir = TempDir::new().unwrap();
        write_dataset(temp_dir.path(), 3);

        let config = RunConfig {
            epochs: 1,
            ..tiny_config()
        };
        let outcome = run_training::<TestAutodiffBackend>(temp_dir.path(), None, &config).unwrap();
        assert!(outcome.model_path.is_none());
        assert_eq!(outcome.train_size + outcome.test_size, 6);
    }

    #[test]
    fn test_run_training_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = run_training::<TestAutodiffBackend>(
            &temp_dir.path().join("missing"),
            None,
            &tiny_config(),
        );
        assert!(matches!(result, Err(TrafficError::PathNotFound(_))));
    }

    #[test]
    fn test_run_training_with_no_images() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("0")).unwrap();
        let result = run_training::<TestAutodiffBackend>(temp_dir.path(), None, &tiny_config());
        assert!(matches!(result, Err(TrafficError::Dataset(_))));
    }
}

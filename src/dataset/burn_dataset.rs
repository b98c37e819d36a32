//! Burn Dataset Integration for traffic signs
//!
//! Implements Burn's `Dataset` trait over the in-memory samples and a
//! `Batcher` that stacks them into image, label and one-hot target tensors.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use crate::dataset::loader::Sample;

const CHANNELS: usize = 3;

/// Encode `label` as a vector of `num_categories` zeros with a single one
pub fn one_hot(label: usize, num_categories: usize) -> Vec<f32> {
    let mut encoded = vec![0.0f32; num_categories];
    if let Some(slot) = encoded.get_mut(label) {
        *slot = 1.0;
    }
    encoded
}

/// A single sample ready for Burn
#[derive(Clone, Debug)]
pub struct TrafficSignItem {
    /// Image data as flattened CHW float array [3 * H * W], scaled to [0, 1]
    pub image: Vec<f32>,
    /// Category index
    pub label: usize,
}

impl TrafficSignItem {
    /// Convert an RGB sample to CHW floats
    pub fn from_sample(sample: &Sample) -> Self {
        let (width, height) = sample.image.dimensions();
        let (width, height) = (width as usize, height as usize);
        let plane = height * width;
        let mut image = vec![0.0f32; CHANNELS * plane];

        for (x, y, pixel) in sample.image.enumerate_pixels() {
            let offset = y as usize * width + x as usize;
            image[offset] = pixel[0] as f32 / 255.0;
            image[plane + offset] = pixel[1] as f32 / 255.0;
            image[2 * plane + offset] = pixel[2] as f32 / 255.0;
        }

        Self {
            image,
            label: sample.label,
        }
    }
}

/// In-memory dataset implementing Burn's Dataset trait
#[derive(Debug, Clone, Default)]
pub struct TrafficSignDataset {
    items: Vec<TrafficSignItem>,
}

impl TrafficSignDataset {
    /// Convert loaded samples into tensor-ready items
    pub fn from_samples(samples: &[Sample]) -> Self {
        Self {
            items: samples.iter().map(TrafficSignItem::from_sample).collect(),
        }
    }

    /// Samples per label, for labels below `num_categories`
    pub fn class_distribution(&self, num_categories: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_categories];
        for item in &self.items {
            if item.label < num_categories {
                counts[item.label] += 1;
            }
        }
        counts
    }
}

impl Dataset<TrafficSignItem> for TrafficSignDataset {
    fn get(&self, index: usize) -> Option<TrafficSignItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of traffic sign images
#[derive(Clone, Debug)]
pub struct TrafficSignBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Category indices with shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
    /// One-hot targets with shape [batch_size, num_categories]
    pub targets: Tensor<B, 2>,
}

/// Batcher producing [`TrafficSignBatch`]es
#[derive(Clone, Debug)]
pub struct TrafficSignBatcher {
    image_width: usize,
    image_height: usize,
    num_categories: usize,
}

impl TrafficSignBatcher {
    pub fn new(image_width: usize, image_height: usize, num_categories: usize) -> Self {
        Self {
            image_width,
            image_height,
            num_categories,
        }
    }
}

impl<B: Backend> Batcher<B, TrafficSignItem, TrafficSignBatch<B>> for TrafficSignBatcher {
    fn batch(&self, items: Vec<TrafficSignItem>, device: &B::Device) -> TrafficSignBatch<B> {
        let batch_size = items.len();

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.iter().copied()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(
                images_data,
                [batch_size, CHANNELS, self.image_height, self.image_width],
            ),
            device,
        );

        let labels_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let labels =
            Tensor::<B, 1, Int>::from_data(TensorData::new(labels_data, [batch_size]), device);

        let targets_data: Vec<f32> = items
            .iter()
            .flat_map(|item| one_hot(item.label, self.num_categories))
            .collect();
        let targets = Tensor::<B, 2>::from_floats(
            TensorData::new(targets_data, [batch_size, self.num_categories]),
            device,
        );

        TrafficSignBatch {
            images,
            labels,
            targets,
        }
    }
}

//! Traffic Sign Dataset Loader
//!
//! Scans a root directory whose immediate subdirectories are named after
//! category indices and decodes every image inside them into a fixed-size
//! RGB array.
//!
//! ```text
//! data_dir/
//! ├── 0/
//! │   ├── 00000_00000.ppm
//! │   └── 00000_00001.ppm
//! ├── 1/
//! │   └── ...
//! └── 42/
//! ```
//!
//! Loading is best-effort: files that fail to decode are logged and skipped,
//! and directories whose names are not numeric are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, RgbImage};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::RunConfig;
use crate::utils::error::{Result, TrafficError};
use crate::utils::logging::progress_bar;

/// A category directory discovered under the dataset root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDir {
    /// Category index parsed from the directory name
    pub label: usize,
    /// Directory name as found on disk
    pub name: String,
    /// Full path to the directory
    pub path: PathBuf,
}

/// One resized image with its category label
#[derive(Debug, Clone)]
pub struct Sample {
    /// RGB pixels, `image_width` x `image_height`
    pub image: RgbImage,
    /// Category index in `[0, num_categories)`
    pub label: usize,
}

/// Samples loaded from disk plus bookkeeping about the scan
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub samples: Vec<Sample>,
    pub stats: DatasetStats,
}

/// Statistics about a loaded dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetStats {
    pub total_samples: usize,
    /// Numeric category directories that were scanned
    pub categories_found: usize,
    /// Image files that could not be decoded
    pub skipped_files: usize,
    /// Samples per label, indexed by label
    pub class_counts: Vec<usize>,
}

impl DatasetStats {
    /// Log per-category counts at debug level and a summary at info level
    pub fn log(&self) {
        for (label, count) in self.class_counts.iter().enumerate() {
            if *count > 0 {
                debug!("  category {:>3}: {:>6} samples", label, count);
            }
        }
        info!(
            "Dataset: {} samples across {} categories ({} files skipped)",
            self.total_samples, self.categories_found, self.skipped_files
        );
    }
}

/// Whether a directory name denotes a category (non-empty, ASCII digits only)
pub fn is_category_dir_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Whether the extension of `path` names a raster format the decoder knows
pub fn is_image_file(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok()
}

/// Find the category directories directly under `root`
///
/// Non-numeric names are skipped silently. Numeric names outside
/// `[0, num_categories)` are skipped with a warning since they cannot be
/// one-hot encoded. The result is sorted by label.
pub fn scan_categories(root: &Path, num_categories: usize) -> Result<Vec<CategoryDir>> {
    if !root.exists() {
        return Err(TrafficError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(TrafficError::Dataset(format!(
            "Data directory is not a directory: {:?}",
            root
        )));
    }

    let mut categories = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !is_category_dir_name(&name) {
            debug!("Skipping non-category directory {:?}", name);
            continue;
        }

        match name.parse::<usize>() {
            Ok(label) if label < num_categories => categories.push(CategoryDir { label, name, path }),
            _ => warn!(
                "Skipping category directory {:?}: label outside 0..{}",
                name, num_categories
            ),
        }
    }

    categories.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.name.cmp(&b.name)));
    Ok(categories)
}

/// Image files directly inside a category directory, sorted by path
pub fn list_image_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_image_file(p))
        .collect();
    files.sort();
    files
}

/// Decode an image, convert it to RGB and resize it to exactly `width` x `height`
pub fn load_image(path: &Path, width: u32, height: u32) -> Result<RgbImage> {
    let img = ImageReader::open(path)
        .map_err(|e| TrafficError::ImageLoad(path.to_path_buf(), e.to_string()))?
        .with_guessed_format()
        .map_err(|e| TrafficError::ImageLoad(path.to_path_buf(), e.to_string()))?
        .decode()
        .map_err(|e| TrafficError::ImageLoad(path.to_path_buf(), e.to_string()))?;

    Ok(img.resize_exact(width, height, FilterType::Triangle).to_rgb8())
}

/// Load every decodable image under the numeric category directories of `root`
pub fn load_data(root: &Path, config: &RunConfig) -> Result<LoadedDataset> {
    info!("Loading traffic sign dataset from: {:?}", root);

    let categories = scan_categories(root, config.num_categories)?;
    info!("Found {} category directories", categories.len());

    let (width, height) = (config.image_width, config.image_height);
    let mut samples = Vec::new();
    let mut skipped_files = 0usize;
    let mut class_counts = vec![0usize; config.num_categories];

    let pb = progress_bar(categories.len() as u64, "Loading categories");
    for category in &categories {
        let files = list_image_files(&category.path);

        let decoded: Vec<(PathBuf, Result<RgbImage>)> = files
            .into_par_iter()
            .map(|path| {
                let image = load_image(&path, width, height);
                (path, image)
            })
            .collect();

        for (path, image) in decoded {
            match image {
                Ok(image) => {
                    class_counts[category.label] += 1;
                    samples.push(Sample {
                        image,
                        label: category.label,
                    });
                }
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    skipped_files += 1;
                }
            }
        }

        debug!(
            "Category '{}' (label {}): {} samples so far",
            category.name, category.label, class_counts[category.label]
        );
        pb.inc(1);
    }
    pb.finish_and_clear();

    let stats = DatasetStats {
        total_samples: samples.len(),
        categories_found: categories.len(),
        skipped_files,
        class_counts,
    };
    stats.log();

    Ok(LoadedDataset { samples, stats })
}

//! Model file persistence
//!
//! Models are serialized with Burn's named MessagePack recorder at full
//! precision and written byte-for-byte to the requested path, whatever its
//! extension.

use std::path::{Path, PathBuf};

use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
    tensor::backend::Backend,
};
use tracing::{debug, info};

use crate::model::cnn::{TrafficNet, TrafficNetConfig};
use crate::utils::error::{Result, TrafficError};

type ModelRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// Save a model to exactly `path`, returning the file written
pub fn save_model<B: Backend>(model: &TrafficNet<B>, path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let bytes = Recorder::<B>::record(&ModelRecorder::default(), model.clone().into_record(), ())
        .map_err(|e| TrafficError::Model(format!("Failed to serialize model: {:?}", e)))?;
    debug!("Recording {} bytes of model weights to {:?}", bytes.len(), path);

    std::fs::write(path, bytes)?;

    info!("Model saved to {:?}", path);
    Ok(path.to_path_buf())
}

/// Rebuild the architecture from `config` and load weights saved by [`save_model`]
pub fn load_model<B: Backend>(
    config: &TrafficNetConfig,
    path: &Path,
    device: &B::Device,
) -> Result<TrafficNet<B>> {
    if !path.exists() {
        return Err(TrafficError::PathNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let record = Recorder::<B>::load(&ModelRecorder::default(), bytes, device)
        .map_err(|e| TrafficError::Model(format!("Failed to load model: {:?}", e)))?;

    Ok(TrafficNet::<B>::new(config, device).load_record(record))
}

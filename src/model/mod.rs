//! Model module
//!
//! - `cnn`: the traffic sign CNN and its configuration
//! - `persistence`: saving and loading trained weights

pub mod cnn;
pub mod persistence;

pub use cnn::{ConvBlock, TrafficNet, TrafficNetConfig};
pub use persistence::{load_model, save_model};

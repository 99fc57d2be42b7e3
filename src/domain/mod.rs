//! Core domain logic: indicators, labeling, dataset assembly, the
//! classifier family, training, and inference. Nothing in here touches
//! the network or the filesystem.

pub mod cv;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod feature;
pub mod indicator;
pub mod label;
pub mod metrics;
pub mod model;
pub mod ohlcv;
pub mod predict;
pub mod scaler;
pub mod train;

//! Web server adapter.
//!
//! Serves the JSON prediction API over axum. Application state carries
//! the data port, the loaded artifact bundle (if a training run has
//! produced one) and the shared prediction log.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::adapters::prediction_log::PredictionLog;
use crate::domain::predict::ArtifactBundle;
use crate::ports::data_port::DataPort;

pub struct AppState {
    pub data_port: Arc<dyn DataPort + Send + Sync>,
    /// `None` until a training run has persisted a bundle; the API then
    /// serves explicitly mock-flagged predictions.
    pub bundle: Option<Arc<ArtifactBundle>>,
    pub log: Arc<PredictionLog>,
    /// Bars of history fetched per prediction request.
    pub history_days: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict/{coin}", get(handlers::predict_coin))
        .route("/api/health", get(handlers::health))
        .with_state(Arc::new(state))
}

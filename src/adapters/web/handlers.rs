//! HTTP request handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::adapters::bybit_adapter::symbol_for_coin;
use crate::adapters::prediction_log::LogRecord;
use crate::domain::feature::{compute_features, FeatureRow};
use crate::domain::ohlcv::PriceBar;
use crate::domain::predict::{predict, Prediction};

use super::{AppState, WebError};

/// Trailing window of closes echoed back for charting.
const HISTORY_WINDOW: usize = 8;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalData {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
    /// Projected prices for the next three bars.
    pub predicted: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub coin_name: String,
    pub predicted_trend: String,
    /// Whole-percent confidence, 0..=100.
    pub confidence_score: u32,
    pub current_price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub volatility: f64,
    pub historical_data: HistoricalData,
    pub timestamp: String,
    /// True when this is a degraded Hold rather than a model output.
    pub fallback: bool,
    /// True when no trained bundle was available at all.
    pub mock: bool,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn predict_coin(
    State(state): State<Arc<AppState>>,
    Path(coin): Path<String>,
) -> Result<Json<PredictResponse>, WebError> {
    let symbol = symbol_for_coin(&coin)
        .ok_or_else(|| WebError::bad_request(format!("unknown coin '{coin}'")))?;

    // The data port may block on I/O; keep it off the async executor.
    let port = Arc::clone(&state.data_port);
    let days = state.history_days;
    let bars = tokio::task::spawn_blocking(move || port.fetch_daily_bars(symbol, days))
        .await
        .map_err(|e| WebError::internal(format!("fetch task failed: {e}")))?
        .map_err(WebError::from)?;

    let features = compute_features(&bars);

    let (prediction, mock) = match &state.bundle {
        Some(bundle) => match predict(bundle, &features) {
            Ok(p) => (p, false),
            // Degrade to a flagged Hold rather than failing the request.
            Err(_) => (fallback_from(&features, &bars), false),
        },
        None => (fallback_from(&features, &bars), true),
    };

    let record = LogRecord {
        timestamp: Utc::now(),
        close: prediction.current_price,
        rsi: prediction.rsi,
        macd: prediction.macd,
        volatility: prediction.volatility,
        action: prediction.signal,
    };
    if let Err(e) = state.log.append(&record) {
        eprintln!("warning: prediction log append failed: {e}");
    }

    Ok(Json(build_response(&coin, &prediction, mock, &bars)))
}

fn fallback_from(features: &[FeatureRow], bars: &[PriceBar]) -> Prediction {
    let close = features
        .last()
        .map(|f| f.close)
        .or_else(|| bars.last().map(|b| b.close))
        .unwrap_or(0.0);
    let mut p = Prediction::hold_fallback(close);
    if let Some(latest) = features.last() {
        p.rsi = latest.rsi;
        p.macd = latest.macd;
        p.volatility = latest.volatility;
    }
    p
}

fn build_response(
    coin: &str,
    prediction: &Prediction,
    mock: bool,
    bars: &[PriceBar],
) -> PredictResponse {
    let tail = &bars[bars.len().saturating_sub(HISTORY_WINDOW)..];
    PredictResponse {
        coin_name: coin.to_string(),
        predicted_trend: prediction.signal.to_string(),
        confidence_score: prediction.confidence as u32,
        current_price: prediction.current_price,
        rsi: prediction.rsi,
        macd: prediction.macd,
        volatility: prediction.volatility,
        historical_data: HistoricalData {
            dates: tail.iter().map(|b| b.date.to_string()).collect(),
            prices: tail.iter().map(|b| b.close).collect(),
            predicted: prediction.projected_prices.to_vec(),
        },
        timestamp: Utc::now().to_rfc3339(),
        fallback: prediction.fallback,
        mock,
    }
}

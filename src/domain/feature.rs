//! Feature engine: raw OHLCV bars to derived indicator rows.
//!
//! Output is aligned 1:1 with input. Every derived field is a function of
//! the current and earlier bars only, so a row computed over a short
//! recent window equals the same row computed over the full history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::indicator;
use crate::domain::ohlcv::PriceBar;

pub const MA_SHORT_PERIOD: usize = 14;
pub const MA_LONG_PERIOD: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const VOLATILITY_PERIOD: usize = 14;

/// A price bar with its derived indicator columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ma14: f64,
    pub ma50: f64,
    pub price_change: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub volatility: f64,
}

impl FeatureRow {
    /// Look up a base feature column by its persisted name.
    /// Returns `None` for names this row does not carry.
    pub fn value(&self, name: &str) -> Option<f64> {
        let v = match name {
            "Close" => self.close,
            "Volume" => self.volume,
            "MA14" => self.ma14,
            "MA50" => self.ma50,
            "Price_Change" => self.price_change,
            "RSI" => self.rsi,
            "MACD" => self.macd,
            "MACD_Signal" => self.macd_signal,
            "MACD_Hist" => self.macd_hist,
            "Volatility" => self.volatility,
            _ => return None,
        };
        Some(v)
    }
}

pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Compute the full feature set for an ordered bar sequence.
///
/// Warmup positions and any non-finite intermediate are 0.0; rows are
/// never dropped, keeping feature and label sequences the same length.
pub fn compute_features(bars: &[PriceBar]) -> Vec<FeatureRow> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let ma14 = indicator::sma(&closes, MA_SHORT_PERIOD);
    let ma50 = indicator::sma(&closes, MA_LONG_PERIOD);
    let price_change = indicator::pct_change(&closes);
    let rsi = indicator::rsi(&closes, RSI_PERIOD);
    let (macd, macd_signal, macd_hist) = indicator::macd(&closes);
    let volatility = indicator::rolling_std(&closes, VOLATILITY_PERIOD);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| FeatureRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            ma14: finite_or_zero(ma14[i]),
            ma50: finite_or_zero(ma50[i]),
            price_change: finite_or_zero(price_change[i]),
            rsi: finite_or_zero(rsi[i]),
            macd: finite_or_zero(macd[i]),
            macd_signal: finite_or_zero(macd_signal[i]),
            macd_hist: finite_or_zero(macd_hist[i]),
            volatility: finite_or_zero(volatility[i]),
        })
        .collect()
}

//! Shared test fixtures: an in-memory data port and a deterministic
//! bar generator.

#![allow(dead_code)]

use std::collections::HashMap;

use chrono::NaiveDate;
use coincast::domain::error::CoincastError;
use coincast::domain::ohlcv::PriceBar;
use coincast::ports::data_port::DataPort;

#[derive(Default)]
pub struct MockDataPort {
    bars: HashMap<String, Vec<PriceBar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_daily_bars(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, CoincastError> {
        match self.bars.get(symbol) {
            Some(bars) => {
                let start = bars.len().saturating_sub(days);
                Ok(bars[start..].to_vec())
            }
            None => Err(CoincastError::Fetch {
                symbol: symbol.to_string(),
                reason: "connection refused".into(),
            }),
        }
    }
}

/// Deterministic daily bars: a slow trend with a repeating wobble, so
/// indicators take a spread of values without any randomness.
pub fn generate_bars(symbol: &str, start: &str, n: usize, base_price: f64) -> Vec<PriceBar> {
    let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    (0..n)
        .map(|i| {
            let trend = i as f64 * 0.3;
            let wobble = ((i * 7) % 13) as f64 - 6.0;
            let close = base_price + trend + wobble;
            PriceBar {
                symbol: symbol.to_string(),
                date: start_date + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1000.0 + ((i * 31) % 500) as f64,
            }
        })
        .collect()
}

//! Bybit market data adapter.
//!
//! Fetches daily spot klines from the v5 REST API. Kline rows arrive
//! newest first as arrays of strings; they are parsed, reversed into
//! chronological order, and validated before being handed to the domain.

use chrono::DateTime;
use serde::Deserialize;

use crate::domain::error::CoincastError;
use crate::domain::ohlcv::{validate_bars, PriceBar};
use crate::ports::data_port::DataPort;

/// Coin names accepted by the serving layer, mapped to Bybit symbols.
pub const COIN_SYMBOLS: [(&str, &str); 5] = [
    ("bitcoin", "BTCUSDT"),
    ("ethereum", "ETHUSDT"),
    ("solana", "SOLUSDT"),
    ("ripple", "XRPUSDT"),
    ("dogecoin", "DOGEUSDT"),
];

/// Bybit symbol for a coin name, case-insensitive. `None` for coins the
/// service does not track.
pub fn symbol_for_coin(coin: &str) -> Option<&'static str> {
    let coin = coin.to_lowercase();
    COIN_SYMBOLS
        .iter()
        .find(|(name, _)| *name == coin)
        .map(|(_, symbol)| *symbol)
}

#[derive(Debug, Deserialize)]
struct KlineResponse {
    #[serde(rename = "retCode")]
    ret_code: i32,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: KlineResult,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Vec<String>>,
}

pub struct BybitAdapter {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl BybitAdapter {
    pub fn new() -> Self {
        Self::with_base_url("https://api.bybit.com")
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn parse_bar(symbol: &str, row: &[String]) -> Option<PriceBar> {
        if row.len() < 6 {
            return None;
        }
        let timestamp_ms: i64 = row[0].parse().ok()?;
        let date = DateTime::from_timestamp_millis(timestamp_ms)?.date_naive();
        Some(PriceBar {
            symbol: symbol.to_string(),
            date,
            open: row[1].parse().ok()?,
            high: row[2].parse().ok()?,
            low: row[3].parse().ok()?,
            close: row[4].parse().ok()?,
            volume: row[5].parse().ok()?,
        })
    }
}

impl Default for BybitAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DataPort for BybitAdapter {
    fn fetch_daily_bars(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, CoincastError> {
        let url = format!("{}/v5/market/kline", self.base_url);
        let limit = days.clamp(1, 1000);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("category", "spot"),
                ("symbol", symbol),
                ("interval", "D"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .map_err(|e| CoincastError::Fetch {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        let data: KlineResponse = response.json().map_err(|e| CoincastError::Fetch {
            symbol: symbol.to_string(),
            reason: format!("malformed response: {e}"),
        })?;

        if data.ret_code != 0 {
            return Err(CoincastError::Fetch {
                symbol: symbol.to_string(),
                reason: data.ret_msg,
            });
        }

        let mut bars: Vec<PriceBar> = data
            .result
            .list
            .iter()
            .filter_map(|row| Self::parse_bar(symbol, row))
            .collect();
        bars.sort_by_key(|b| b.date);

        validate_bars(symbol, &bars)?;
        Ok(bars)
    }
}

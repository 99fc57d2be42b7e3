//! OHLCV bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::CoincastError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Check that a bar sequence is usable as model input: non-empty,
/// strictly ascending dates, no duplicates.
pub fn validate_bars(symbol: &str, bars: &[PriceBar]) -> Result<(), CoincastError> {
    if bars.is_empty() {
        return Err(CoincastError::NoData {
            symbol: symbol.to_string(),
        });
    }
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(CoincastError::UnorderedData {
                symbol: symbol.to_string(),
                date: pair[1].date,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            symbol: "BTCUSDT".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn validate_accepts_ascending_dates() {
        let bars = vec![bar("2024-01-01", 100.0), bar("2024-01-02", 101.0)];
        assert!(validate_bars("BTCUSDT", &bars).is_ok());
    }

    #[test]
    fn validate_rejects_empty() {
        let result = validate_bars("BTCUSDT", &[]);
        assert!(matches!(result, Err(CoincastError::NoData { .. })));
    }

    #[test]
    fn validate_rejects_duplicate_dates() {
        let bars = vec![bar("2024-01-01", 100.0), bar("2024-01-01", 101.0)];
        let result = validate_bars("BTCUSDT", &bars);
        assert!(matches!(result, Err(CoincastError::UnorderedData { .. })));
    }

    #[test]
    fn validate_rejects_descending_dates() {
        let bars = vec![bar("2024-01-02", 100.0), bar("2024-01-01", 101.0)];
        let result = validate_bars("BTCUSDT", &bars);
        assert!(matches!(result, Err(CoincastError::UnorderedData { .. })));
    }
}

//! Market data access port trait.

use crate::domain::error::CoincastError;
use crate::domain::ohlcv::PriceBar;

pub trait DataPort {
    /// Fetch up to `days` daily bars for `symbol`, oldest first.
    fn fetch_daily_bars(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, CoincastError>;
}

//! CSV price cache adapter.
//!
//! The fetch command writes one `<SYMBOL>.csv` per symbol into the cache
//! directory; training reads it back through [`DataPort`] so the
//! pipeline never depends on network availability.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::CoincastError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    cache_dir: PathBuf,
}

impl CsvAdapter {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("{symbol}.csv"))
    }

    /// Write bars to the cache, replacing any existing file.
    pub fn write_bars(&self, symbol: &str, bars: &[PriceBar]) -> Result<(), CoincastError> {
        fs::create_dir_all(&self.cache_dir)?;
        let path = self.csv_path(symbol);
        let mut writer = csv::Writer::from_path(&path).map_err(|e| CoincastError::DataSource {
            reason: format!("failed to open {}: {e}", path.display()),
        })?;

        writer
            .write_record(["date", "open", "high", "low", "close", "volume"])
            .map_err(|e| CoincastError::DataSource {
                reason: format!("CSV write error: {e}"),
            })?;
        for bar in bars {
            writer
                .write_record([
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.volume.to_string(),
                ])
                .map_err(|e| CoincastError::DataSource {
                    reason: format!("CSV write error: {e}"),
                })?;
        }
        writer.flush()?;
        Ok(())
    }

    fn parse_field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, CoincastError> {
        record
            .get(idx)
            .ok_or_else(|| CoincastError::DataSource {
                reason: format!("missing {name} column"),
            })?
            .parse()
            .map_err(|e| CoincastError::DataSource {
                reason: format!("invalid {name} value: {e}"),
            })
    }
}

impl DataPort for CsvAdapter {
    fn fetch_daily_bars(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, CoincastError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| CoincastError::DataSource {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|e| CoincastError::DataSource {
                reason: format!("CSV parse error: {e}"),
            })?;

            let date_str = record.get(0).ok_or_else(|| CoincastError::DataSource {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                CoincastError::DataSource {
                    reason: format!("invalid date format: {e}"),
                }
            })?;

            bars.push(PriceBar {
                symbol: symbol.to_string(),
                date,
                open: Self::parse_field(&record, 1, "open")?,
                high: Self::parse_field(&record, 2, "high")?,
                low: Self::parse_field(&record, 3, "low")?,
                close: Self::parse_field(&record, 4, "close")?,
                volume: Self::parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        if bars.len() > days {
            bars.drain(..bars.len() - days);
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| PriceBar {
                symbol: "BTCUSDT".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: 100.0 + i as f64,
                high: 101.0 + i as f64,
                low: 99.0 + i as f64,
                close: 100.5 + i as f64,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let bars = sample_bars(5);
        adapter.write_bars("BTCUSDT", &bars).unwrap();

        let back = adapter.fetch_daily_bars("BTCUSDT", 100).unwrap();
        assert_eq!(back, bars);
    }

    #[test]
    fn fetch_keeps_the_most_recent_days() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        adapter.write_bars("BTCUSDT", &sample_bars(10)).unwrap();

        let back = adapter.fetch_daily_bars("BTCUSDT", 3).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[0].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[test]
    fn fetch_sorts_rows_by_date() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let mut bars = sample_bars(4);
        bars.reverse();
        adapter.write_bars("ETHUSDT", &bars).unwrap();

        let back = adapter.fetch_daily_bars("ETHUSDT", 100).unwrap();
        for pair in back.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn missing_cache_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(adapter.fetch_daily_bars("XRPUSDT", 10).is_err());
    }

    #[test]
    fn malformed_row_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("DOGEUSDT.csv"),
            "date,open,high,low,close,volume\n2024-01-01,a,b,c,d,e\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(adapter.fetch_daily_bars("DOGEUSDT", 10).is_err());
    }
}

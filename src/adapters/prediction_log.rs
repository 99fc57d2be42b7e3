//! Append-only CSV log of served predictions.
//!
//! The header is written once when the file is created; afterwards each
//! record is appended in a single write under a mutex, so concurrent
//! handlers never interleave partial lines.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::error::CoincastError;
use crate::domain::label::Signal;

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub rsi: f64,
    pub macd: f64,
    pub volatility: f64,
    pub action: Signal,
}

pub struct PredictionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

const HEADER: &str = "timestamp,close,RSI,MACD,volatility,action\n";

impl PredictionLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn append(&self, record: &LogRecord) -> Result<(), CoincastError> {
        let line = format!(
            "{},{},{},{},{},{}\n",
            record.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            record.close,
            record.rsi,
            record.macd,
            record.volatility,
            record.action,
        );

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut payload = String::new();
        if is_new {
            payload.push_str(HEADER);
        }
        payload.push_str(&line);
        file.write_all(payload.as_bytes())?;
        Ok(())
    }
}

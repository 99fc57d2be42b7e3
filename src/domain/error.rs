//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for coincast.
#[derive(Debug, thiserror::Error)]
pub enum CoincastError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("price data for {symbol} out of order at {date}")]
    UnorderedData { symbol: String, date: NaiveDate },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("market data fetch failed for {symbol}: {reason}")]
    Fetch { symbol: String, reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("training failed: {reason}")]
    Training { reason: String },

    #[error("no candidate model trained successfully")]
    NoTrainedModel,

    #[error("prediction failed: {reason}")]
    Prediction { reason: String },

    #[error("artifact missing: {path}")]
    ArtifactMissing { path: String },

    #[error("artifact corrupt at {path}: {reason}")]
    ArtifactCorrupt { path: String, reason: String },

    #[error("required feature '{name}' not found in latest data")]
    FeatureMissing { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoincastError {
    /// Process exit code for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            CoincastError::Io(_) => 1,
            CoincastError::ConfigParse { .. }
            | CoincastError::ConfigMissing { .. }
            | CoincastError::ConfigInvalid { .. } => 2,
            CoincastError::Fetch { .. } | CoincastError::DataSource { .. } => 3,
            CoincastError::Training { .. } | CoincastError::NoTrainedModel => 4,
            CoincastError::NoData { .. }
            | CoincastError::UnorderedData { .. }
            | CoincastError::InsufficientData { .. } => 5,
            CoincastError::ArtifactMissing { .. }
            | CoincastError::ArtifactCorrupt { .. }
            | CoincastError::FeatureMissing { .. }
            | CoincastError::Prediction { .. } => 6,
        }
    }
}

impl From<&CoincastError> for std::process::ExitCode {
    fn from(err: &CoincastError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}

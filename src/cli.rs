//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::artifact_store::ArtifactStore;
use crate::adapters::bybit_adapter::BybitAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::prediction_log::{LogRecord, PredictionLog};
use crate::adapters::report_adapter::ReportAdapter;
use crate::domain::dataset::build_dataset;
use crate::domain::error::CoincastError;
use crate::domain::feature::compute_features;
use crate::domain::label::attach_labels;
use crate::domain::ohlcv::{validate_bars, PriceBar};
use crate::domain::predict::predict;
use crate::domain::train::{train, TrainConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
#[cfg(feature = "web")]
use std::sync::Arc;

/// Bars below this cannot warm up the long moving average plus a
/// meaningful training tail.
const MIN_TRAINING_BARS: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "coincast", about = "Crypto trend classifier and prediction API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch daily bars from the exchange into the CSV cache
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Train the classifier ensemble and persist the artifacts
    Train {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Run one prediction and print it as JSON
    Predict {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Start the prediction API server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Fetch { config, symbol } => run_fetch(&config, symbol.as_deref()),
        Command::Train { config, symbol } => run_train(&config, symbol.as_deref()),
        Command::Predict { config, symbol } => run_predict(&config, symbol.as_deref()),
        Command::Serve { config } => run_serve(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = CoincastError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn resolve_symbol(override_symbol: Option<&str>, config: &dyn ConfigPort) -> Result<String, ExitCode> {
    if let Some(s) = override_symbol {
        return Ok(s.to_uppercase());
    }
    match config.get_string("data", "symbol") {
        Some(s) => Ok(s.to_uppercase()),
        None => {
            let err = CoincastError::ConfigMissing {
                section: "data".into(),
                key: "symbol".into(),
            };
            eprintln!("error: {err}");
            Err(ExitCode::from(&err))
        }
    }
}

fn cache_adapter(config: &dyn ConfigPort) -> CsvAdapter {
    let dir = config
        .get_string("data", "cache_dir")
        .unwrap_or_else(|| "data/cache".to_string());
    CsvAdapter::new(PathBuf::from(dir))
}

fn history_days(config: &dyn ConfigPort) -> usize {
    config.get_int("data", "history_days", 365).max(1) as usize
}

fn run_fetch(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let symbol = match resolve_symbol(symbol_override, &config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let days = history_days(&config);

    eprintln!("Fetching {days} daily bars for {symbol}");
    let exchange = BybitAdapter::new();
    let bars = match exchange.fetch_daily_bars(&symbol, days) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let cache = cache_adapter(&config);
    if let Err(e) = cache.write_bars(&symbol, &bars) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Cached {} bars for {symbol}", bars.len());
    ExitCode::SUCCESS
}

/// Cached bars if present, otherwise a live fetch that fills the cache.
fn load_bars(
    symbol: &str,
    days: usize,
    cache: &CsvAdapter,
) -> Result<Vec<PriceBar>, CoincastError> {
    match cache.fetch_daily_bars(symbol, days) {
        Ok(bars) if !bars.is_empty() => Ok(bars),
        _ => {
            eprintln!("No cached data for {symbol}, fetching from exchange");
            let bars = BybitAdapter::new().fetch_daily_bars(symbol, days)?;
            cache.write_bars(symbol, &bars)?;
            Ok(bars)
        }
    }
}

fn run_train(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let symbol = match resolve_symbol(symbol_override, &config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match train_pipeline(&config, &symbol) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn train_pipeline(config: &dyn ConfigPort, symbol: &str) -> Result<(), CoincastError> {
    let days = history_days(config);
    let cache = cache_adapter(config);

    let bars = load_bars(symbol, days, &cache)?;
    validate_bars(symbol, &bars)?;
    if bars.len() < MIN_TRAINING_BARS {
        return Err(CoincastError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum: MIN_TRAINING_BARS,
        });
    }
    eprintln!("Training on {} bars of {symbol}", bars.len());

    let features = compute_features(&bars);
    let labeled = attach_labels(&features);
    let dataset = build_dataset(&labeled)?;

    let train_config = TrainConfig {
        train_fraction: config.get_double("train", "train_fraction", 0.8),
        cv_splits: config.get_int("train", "cv_splits", 5).max(1) as usize,
        seed: config.get_int("train", "seed", 42) as u64,
    };
    let outcome = train(&dataset, &train_config)?;

    for (name, reason) in &outcome.skipped {
        eprintln!("warning: skipping {name} ({reason})");
    }
    eprintln!("\n=== Candidate Results ===");
    for candidate in &outcome.candidates {
        eprintln!(
            "  {:<18} test accuracy {:.4}",
            candidate.name, candidate.test_accuracy
        );
    }
    eprintln!("Best model: {}", outcome.best_name);

    let artifact_dir = config
        .get_string("train", "artifact_dir")
        .unwrap_or_else(|| "model/saved".to_string());
    let store = ArtifactStore::new(PathBuf::from(&artifact_dir));
    store.save(&outcome)?;
    eprintln!("Artifacts written to {artifact_dir}");

    let report_dir = config
        .get_string("train", "report_dir")
        .unwrap_or_else(|| "reports".to_string());
    let reports = ReportAdapter::new(PathBuf::from(&report_dir));
    reports.write(&outcome.diagnostics, &outcome.encoder)?;
    eprintln!("Reports written to {report_dir}");

    Ok(())
}

fn run_predict(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let symbol = match resolve_symbol(symbol_override, &config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match predict_pipeline(&config, &symbol) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn predict_pipeline(config: &dyn ConfigPort, symbol: &str) -> Result<(), CoincastError> {
    let artifact_dir = config
        .get_string("train", "artifact_dir")
        .unwrap_or_else(|| "model/saved".to_string());
    let bundle = ArtifactStore::new(PathBuf::from(artifact_dir)).load()?;

    let days = history_days(config);
    let bars = BybitAdapter::new().fetch_daily_bars(symbol, days)?;
    let features = compute_features(&bars);
    let prediction = predict(&bundle, &features)?;

    let log_path = config
        .get_string("web", "prediction_log")
        .unwrap_or_else(|| "logs/predictions.csv".to_string());
    PredictionLog::new(PathBuf::from(log_path)).append(&LogRecord {
        timestamp: chrono::Utc::now(),
        close: prediction.current_price,
        rsi: prediction.rsi,
        macd: prediction.macd,
        volatility: prediction.volatility,
        action: prediction.signal,
    })?;

    let json = serde_json::to_string_pretty(&prediction).map_err(|e| CoincastError::Prediction {
        reason: format!("failed to serialize prediction: {e}"),
    })?;
    println!("{json}");
    Ok(())
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{build_router, AppState};
        use std::net::SocketAddr;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let artifact_dir = config
            .get_string("train", "artifact_dir")
            .unwrap_or_else(|| "model/saved".to_string());
        let store = ArtifactStore::new(PathBuf::from(&artifact_dir));
        let bundle = match store.load() {
            Ok(b) => Some(Arc::new(b)),
            Err(e) => {
                eprintln!("warning: no usable artifact bundle ({e}); serving mock predictions");
                None
            }
        };

        let log_path = config
            .get_string("web", "prediction_log")
            .unwrap_or_else(|| "logs/predictions.csv".to_string());

        let addr: SocketAddr = match config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:8000".to_string())
            .parse()
        {
            Ok(a) => a,
            Err(e) => {
                let err = CoincastError::ConfigInvalid {
                    section: "web".into(),
                    key: "listen".into(),
                    reason: e.to_string(),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        };

        let state = AppState {
            data_port: Arc::new(BybitAdapter::new())
                as Arc<dyn DataPort + Send + Sync>,
            bundle,
            log: Arc::new(PredictionLog::new(PathBuf::from(log_path))),
            history_days: history_days(&config),
        };

        eprintln!("Starting prediction API on {addr}");
        let router = build_router(state);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("error: failed to start runtime: {e}");
                return ExitCode::from(1);
            }
        };
        let served = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await
        });
        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: server failed: {e}");
                ExitCode::from(1)
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

//! Inference over a loaded artifact bundle.
//!
//! The feature vector is assembled in the order the bundle's persisted
//! feature list dictates, scaled with the training-time scaler (never
//! refit), and pushed through the best model. Any name the assembler
//! does not recognize fails fast; serving layers degrade to an
//! explicitly flagged Hold instead of surfacing an error to clients.

use serde::{Deserialize, Serialize};

use crate::domain::encoder::LabelEncoder;
use crate::domain::error::CoincastError;
use crate::domain::feature::{finite_or_zero, FeatureRow};
use crate::domain::label::Signal;
use crate::domain::model::TrainedModel;
use crate::domain::scaler::StandardScaler;

/// Everything persisted by a training run that inference needs.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub model: TrainedModel,
    pub scaler: StandardScaler,
    pub encoder: LabelEncoder,
    pub feature_names: Vec<String>,
}

/// Price projection multipliers for the next three bars, per signal.
const BUY_PROJECTION: [f64; 3] = [1.01, 1.02, 1.025];
const SELL_PROJECTION: [f64; 3] = [0.99, 0.98, 0.975];
const HOLD_PROJECTION: [f64; 3] = [1.003, 1.005, 1.002];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub signal: Signal,
    /// Rounded percentage of the winning class probability.
    pub confidence: f64,
    pub current_price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub volatility: f64,
    pub projected_prices: [f64; 3],
    /// True when this is a degraded stand-in rather than a model output.
    pub fallback: bool,
}

impl Prediction {
    /// Degraded output for when inference cannot run.
    pub fn hold_fallback(current_price: f64) -> Self {
        Self {
            signal: Signal::Hold,
            confidence: 0.0,
            current_price,
            rsi: 0.0,
            macd: 0.0,
            volatility: 0.0,
            projected_prices: project(Signal::Hold, current_price),
            fallback: true,
        }
    }
}

pub fn predict(bundle: &ArtifactBundle, features: &[FeatureRow]) -> Result<Prediction, CoincastError> {
    let latest = features.last().ok_or_else(|| CoincastError::Prediction {
        reason: "no feature rows to predict from".into(),
    })?;
    let previous = features.len().checked_sub(2).map(|i| &features[i]);

    let raw = assemble_vector(&bundle.feature_names, latest, previous)?;
    let scaled = bundle.scaler.transform_row(&raw)?;

    let probs = bundle.model.predict_proba_one(&scaled);
    let (class, top) = probs
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .ok_or_else(|| CoincastError::Prediction {
            reason: "model produced an empty probability vector".into(),
        })?;
    let signal = bundle
        .encoder
        .decode(class)
        .ok_or_else(|| CoincastError::Prediction {
            reason: format!("class index {class} is outside the encoder"),
        })?;

    Ok(Prediction {
        signal,
        confidence: (100.0 * top).round(),
        current_price: latest.close,
        rsi: latest.rsi,
        macd: latest.macd,
        volatility: latest.volatility,
        projected_prices: project(signal, latest.close),
        fallback: false,
    })
}

/// Build the unscaled vector in the persisted feature order. The change
/// columns need a previous row; with a single row of history they fall
/// back to zero.
fn assemble_vector(
    feature_names: &[String],
    latest: &FeatureRow,
    previous: Option<&FeatureRow>,
) -> Result<Vec<f64>, CoincastError> {
    feature_names
        .iter()
        .map(|name| match name.as_str() {
            "RSI_Change" => Ok(previous.map(|p| latest.rsi - p.rsi).unwrap_or(0.0)),
            "MACD_Change" => Ok(previous.map(|p| latest.macd - p.macd).unwrap_or(0.0)),
            "MA_Ratio" => Ok(finite_or_zero(latest.ma14 / latest.ma50)),
            "Price_MA14_Ratio" => Ok(finite_or_zero(latest.close / latest.ma14)),
            base => latest
                .value(base)
                .ok_or_else(|| CoincastError::FeatureMissing { name: name.clone() }),
        })
        .collect()
}

fn project(signal: Signal, price: f64) -> [f64; 3] {
    let multipliers = match signal {
        Signal::Buy => BUY_PROJECTION,
        Signal::Sell => SELL_PROJECTION,
        Signal::Hold => HOLD_PROJECTION,
    };
    multipliers.map(|m| price * m)
}

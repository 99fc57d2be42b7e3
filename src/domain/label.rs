//! Rule-based labeling: majority vote over trend, RSI and MACD signals.
//!
//! Used once per historical row to build training labels; inference runs
//! the trained classifier instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::feature::FeatureRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Hold,
    Sell,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Buy, Signal::Hold, Signal::Sell];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "Buy",
            Signal::Hold => "Hold",
            Signal::Sell => "Sell",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buy" => Ok(Signal::Buy),
            "Hold" => Ok(Signal::Hold),
            "Sell" => Ok(Signal::Sell),
            other => Err(format!("unknown signal: {other}")),
        }
    }
}

/// Label one featured row.
///
/// Three independent votes, each optionally Buy or Sell:
/// - trend: close above MA14 above MA50 is Buy; both reversed is Sell
/// - RSI: below 30 is Buy, above 70 is Sell
/// - MACD: line above signal is Buy, below is Sell, equal casts nothing
///
/// Majority of cast votes wins; a tie or no votes at all is Hold.
pub fn label_row(row: &FeatureRow) -> Signal {
    let mut buys = 0u32;
    let mut sells = 0u32;

    if row.close > row.ma14 && row.ma14 > row.ma50 {
        buys += 1;
    } else if row.close < row.ma14 && row.ma14 < row.ma50 {
        sells += 1;
    }

    if row.rsi < 30.0 {
        buys += 1;
    } else if row.rsi > 70.0 {
        sells += 1;
    }

    if row.macd > row.macd_signal {
        buys += 1;
    } else if row.macd < row.macd_signal {
        sells += 1;
    }

    if buys > sells {
        Signal::Buy
    } else if sells > buys {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// A featured row with its label and the auxiliary next-bar return used
/// only for backtest reporting, never as model input.
#[derive(Debug, Clone)]
pub struct LabeledRow {
    pub features: FeatureRow,
    pub signal: Signal,
    pub next_close: Option<f64>,
    pub next_day_return: f64,
}

/// Attach labels and next-bar returns to a featured sequence.
/// The final row keeps `next_close = None`; the training pipeline drops it.
pub fn attach_labels(rows: &[FeatureRow]) -> Vec<LabeledRow> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let next_close = rows.get(i + 1).map(|n| n.close);
            let next_day_return = match next_close {
                Some(next) if row.close != 0.0 => next / row.close - 1.0,
                _ => 0.0,
            };
            LabeledRow {
                features: row.clone(),
                signal: label_row(row),
                next_close,
                next_day_return,
            }
        })
        .collect()
}

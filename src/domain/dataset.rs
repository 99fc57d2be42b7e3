//! Training dataset assembly.
//!
//! Turns labeled feature rows into an unscaled numeric matrix in the
//! canonical feature order, deriving the ratio/change columns and
//! applying the missing-value policy: infinities become missing, missing
//! values take the per-column mean, and a final safety pass zeroes
//! anything still non-finite.

use chrono::NaiveDate;

use crate::domain::error::CoincastError;
use crate::domain::label::{LabeledRow, Signal};

/// Canonical feature order. The persisted copy of this list is the
/// binding contract between the scaler fit at training time and every
/// vector assembled at inference time.
pub const FEATURE_NAMES: [&str; 14] = [
    "Close",
    "Volume",
    "MA14",
    "MA50",
    "Price_Change",
    "RSI",
    "MACD",
    "MACD_Signal",
    "MACD_Hist",
    "Volatility",
    "RSI_Change",
    "MACD_Change",
    "MA_Ratio",
    "Price_MA14_Ratio",
];

#[derive(Debug, Clone)]
pub struct Dataset {
    pub dates: Vec<NaiveDate>,
    /// Unscaled rows, columns in `FEATURE_NAMES` order.
    pub matrix: Vec<Vec<f64>>,
    pub labels: Vec<Signal>,
    /// Auxiliary next-bar returns, for backtest reporting only.
    pub next_day_returns: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}

fn ratio_or_missing(numerator: f64, denominator: f64) -> Option<f64> {
    let v = numerator / denominator;
    v.is_finite().then_some(v)
}

/// Build the training dataset from labeled rows.
///
/// Drops rows without a following bar (the final row), derives
/// RSI_Change, MACD_Change, MA_Ratio and Price_MA14_Ratio, and applies
/// the column-mean fill. Fails if nothing usable remains.
pub fn build_dataset(labeled: &[LabeledRow]) -> Result<Dataset, CoincastError> {
    let rows: Vec<&LabeledRow> = labeled.iter().filter(|r| r.next_close.is_some()).collect();
    if rows.is_empty() {
        return Err(CoincastError::Training {
            reason: "no rows with a next-bar close to train on".into(),
        });
    }

    let n = rows.len();
    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(FEATURE_NAMES.len());

    for name in FEATURE_NAMES {
        let column: Vec<Option<f64>> = match name {
            "RSI_Change" => (0..n)
                .map(|i| {
                    (i > 0).then(|| rows[i].features.rsi - rows[i - 1].features.rsi)
                })
                .collect(),
            "MACD_Change" => (0..n)
                .map(|i| {
                    (i > 0).then(|| rows[i].features.macd - rows[i - 1].features.macd)
                })
                .collect(),
            "MA_Ratio" => rows
                .iter()
                .map(|r| ratio_or_missing(r.features.ma14, r.features.ma50))
                .collect(),
            "Price_MA14_Ratio" => rows
                .iter()
                .map(|r| ratio_or_missing(r.features.close, r.features.ma14))
                .collect(),
            base => rows
                .iter()
                .map(|r| {
                    let v = r.features.value(base).unwrap_or(0.0);
                    v.is_finite().then_some(v)
                })
                .collect(),
        };
        columns.push(column);
    }

    // Column-mean fill over present values; the safety pass below
    // catches columns with no present values at all.
    for column in &mut columns {
        let present: Vec<f64> = column.iter().flatten().copied().collect();
        let mean = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };
        for v in column.iter_mut() {
            if v.is_none() {
                *v = Some(mean);
            }
        }
    }

    let matrix: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            columns
                .iter()
                .map(|col| {
                    let v = col[i].unwrap_or(0.0);
                    if v.is_finite() { v } else { 0.0 }
                })
                .collect()
        })
        .collect();

    Ok(Dataset {
        dates: rows.iter().map(|r| r.features.date).collect(),
        matrix,
        labels: rows.iter().map(|r| r.signal).collect(),
        next_day_returns: rows.iter().map(|r| r.next_day_return).collect(),
    })
}

/// Index of the first test row for a chronological split: earlier rows
/// train, later rows test. Rows are never shuffled.
pub fn split_index(n_rows: usize, train_fraction: f64) -> usize {
    (n_rows as f64 * train_fraction) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feature::FeatureRow;
    use crate::domain::label::attach_labels;

    fn feature_row(i: usize, close: f64, ma14: f64, ma50: f64) -> FeatureRow {
        FeatureRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
            ma14,
            ma50,
            price_change: 0.01,
            rsi: 50.0 + i as f64,
            macd: i as f64 * 0.1,
            macd_signal: 0.0,
            macd_hist: i as f64 * 0.1,
            volatility: 1.0,
        }
    }

    fn sample_labeled(n: usize) -> Vec<crate::domain::label::LabeledRow> {
        let rows: Vec<FeatureRow> = (0..n)
            .map(|i| feature_row(i, 100.0 + i as f64, 99.0, 98.0))
            .collect();
        attach_labels(&rows)
    }

    #[test]
    fn drops_final_row_without_next_close() {
        let ds = build_dataset(&sample_labeled(10)).unwrap();
        assert_eq!(ds.len(), 9);
    }

    #[test]
    fn matrix_columns_follow_feature_names() {
        let ds = build_dataset(&sample_labeled(10)).unwrap();
        assert_eq!(ds.matrix[0].len(), FEATURE_NAMES.len());
        // Column 0 is Close.
        assert_eq!(ds.matrix[0][0], 100.0);
        assert_eq!(ds.matrix[1][0], 101.0);
    }

    #[test]
    fn first_row_diffs_take_the_column_mean() {
        let ds = build_dataset(&sample_labeled(10)).unwrap();
        let rsi_change_idx = FEATURE_NAMES
            .iter()
            .position(|n| *n == "RSI_Change")
            .unwrap();
        // RSI climbs by exactly 1 each row, so every real diff is 1 and
        // the filled first row must equal their mean.
        assert!((ds.matrix[0][rsi_change_idx] - 1.0).abs() < 1e-12);
        assert!((ds.matrix[1][rsi_change_idx] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_ratio_becomes_column_mean() {
        let mut rows: Vec<FeatureRow> = (0..6)
            .map(|i| feature_row(i, 100.0, 50.0, 25.0))
            .collect();
        rows[2].ma50 = 0.0; // MA_Ratio infinite here
        let ds = build_dataset(&attach_labels(&rows)).unwrap();
        let ma_ratio_idx = FEATURE_NAMES.iter().position(|n| *n == "MA_Ratio").unwrap();
        // Other rows have ratio 2.0; the degenerate row takes their mean.
        assert!((ds.matrix[2][ma_ratio_idx] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn matrix_is_always_finite() {
        let mut rows: Vec<FeatureRow> = (0..6)
            .map(|i| feature_row(i, 100.0, 0.0, 0.0))
            .collect();
        rows[0].volatility = f64::INFINITY;
        let ds = build_dataset(&attach_labels(&rows)).unwrap();
        for row in &ds.matrix {
            for v in row {
                assert!(v.is_finite());
            }
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(build_dataset(&[]).is_err());
    }

    #[test]
    fn split_index_is_80th_percentile() {
        assert_eq!(split_index(100, 0.8), 80);
        assert_eq!(split_index(99, 0.8), 79);
        assert_eq!(split_index(5, 0.8), 4);
    }
}

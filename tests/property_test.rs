//! Property tests over the feature and labeling pipeline.

use chrono::NaiveDate;
use proptest::prelude::*;

use coincast::domain::cv::time_series_split;
use coincast::domain::encoder::LabelEncoder;
use coincast::domain::feature::compute_features;
use coincast::domain::label::{attach_labels, Signal};
use coincast::domain::ohlcv::PriceBar;
use coincast::domain::predict::Prediction;

fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            symbol: "BTCUSDT".into(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000.0,
        })
        .collect()
}

proptest! {
    #[test]
    fn rsi_stays_within_bounds(closes in prop::collection::vec(1.0f64..10_000.0, 15..120)) {
        let features = compute_features(&bars_from_closes(&closes));
        for row in &features {
            prop_assert!(row.rsi.is_finite());
            prop_assert!((0.0..=100.0).contains(&row.rsi));
        }
    }

    #[test]
    fn indicators_are_always_finite(closes in prop::collection::vec(1.0f64..10_000.0, 2..100)) {
        let features = compute_features(&bars_from_closes(&closes));
        for row in &features {
            prop_assert!(row.macd.is_finite());
            prop_assert!(row.macd_signal.is_finite());
            prop_assert!(row.volatility.is_finite());
            prop_assert!(row.price_change.is_finite());
        }
    }

    #[test]
    fn only_the_last_row_lacks_a_next_close(closes in prop::collection::vec(1.0f64..10_000.0, 2..60)) {
        let features = compute_features(&bars_from_closes(&closes));
        let labeled = attach_labels(&features);
        prop_assert_eq!(labeled.len(), features.len());
        for (i, row) in labeled.iter().enumerate() {
            if i + 1 < labeled.len() {
                prop_assert_eq!(row.next_close, Some(features[i + 1].close));
            } else {
                prop_assert_eq!(row.next_close, None);
            }
        }
    }

    #[test]
    fn encoder_round_trips_every_signal(raw in prop::collection::vec(0u8..3, 1..50)) {
        let labels: Vec<Signal> = raw
            .iter()
            .map(|r| match r {
                0 => Signal::Buy,
                1 => Signal::Hold,
                _ => Signal::Sell,
            })
            .collect();
        let encoder = LabelEncoder::fit(&labels);
        prop_assert_eq!(encoder.n_classes(), 3);
        for &label in &labels {
            let class = encoder.encode(label);
            prop_assert_eq!(encoder.decode(class), Some(label));
        }
    }

    #[test]
    fn cv_folds_never_look_ahead(n in 2usize..200, k in 1usize..8) {
        for split in time_series_split(n, k) {
            let max_train = split.train_indices.iter().max().copied().unwrap_or(0);
            let min_test = split.test_indices.iter().min().copied().unwrap_or(n);
            prop_assert!(max_train < min_test);
            prop_assert!(split.test_indices.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn fallback_projections_scale_with_price(price in 0.01f64..1_000_000.0) {
        let p = Prediction::hold_fallback(price);
        prop_assert!(p.fallback);
        for projected in p.projected_prices {
            prop_assert!((projected / price - 1.0).abs() < 0.01);
        }
    }
}

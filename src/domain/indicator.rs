//! Technical indicator primitives.
//!
//! Every function takes a close-price series and returns a vector of the
//! same length, aligned index for index with the input. Positions with
//! insufficient trailing history hold 0.0 instead of being dropped, so
//! indicator columns always line up with their bars.

/// Simple moving average over a trailing window.
/// First (period - 1) positions are 0.0.
pub fn sma(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; closes.len()];
    if period == 0 {
        return out;
    }
    let mut sum = 0.0;
    for i in 0..closes.len() {
        sum += closes[i];
        if i >= period {
            sum -= closes[i - period];
        }
        if i + 1 >= period {
            out[i] = sum / period as f64;
        }
    }
    out
}

/// Fractional close-to-close change. First position is 0.0; a zero
/// previous close also yields 0.0 rather than infinity.
pub fn pct_change(closes: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        let prev = closes[i - 1];
        if prev != 0.0 {
            out[i] = closes[i] / prev - 1.0;
        }
    }
    out
}

/// Relative Strength Index over trailing simple averages of gains and
/// losses (the rolling-mean variant, not Wilder smoothing).
///
/// RS = mean(gains over last `period` deltas) / mean(losses over same).
/// RSI = 100 - 100/(1 + RS).
///
/// Zero-average-loss policy: with gains present RSI = 100 (the limit of
/// the formula); with neither gains nor losses the value is 0.0, the same
/// default-fill every warmup position gets. Applied identically at
/// training and inference.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; closes.len()];
    if period == 0 || closes.len() < 2 {
        return out;
    }

    let mut gains = vec![0.0; closes.len()];
    let mut losses = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    // Index i uses the deltas at (i - period + 1)..=i; the earliest delta
    // lives at index 1, so the first defined position is `period`.
    for i in period..closes.len() {
        let start = i + 1 - period;
        let avg_gain: f64 = gains[start..=i].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[start..=i].iter().sum::<f64>() / period as f64;

        out[i] = if avg_loss == 0.0 {
            if avg_gain > 0.0 { 100.0 } else { 0.0 }
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
    }
    out
}

/// Exponential moving average, adjust disabled: k = 2/(period+1), seeded
/// with the first value, defined from the first position.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if period == 0 || values.is_empty() {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut current = values[0];
    out[0] = current;
    for i in 1..values.len() {
        current = values[i] * k + current * (1.0 - k);
        out[i] = current;
    }
    out
}

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// MACD line, signal line and histogram: EMA(12) - EMA(26), EMA(9) of the
/// line, and their difference.
pub fn macd(closes: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let fast = ema(closes, MACD_FAST);
    let slow = ema(closes, MACD_SLOW);

    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema(&line, MACD_SIGNAL);
    let hist: Vec<f64> = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

    (line, signal, hist)
}

/// Trailing sample standard deviation (n - 1 denominator).
/// First (period - 1) positions are 0.0; period < 2 yields all zeros.
pub fn rolling_std(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; closes.len()];
    if period < 2 {
        return out;
    }
    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|c| {
                let diff = c - mean;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;
        out[i] = variance.sqrt();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_warmup_and_values() {
        let out = sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], 20.0);
        assert_relative_eq!(out[3], 30.0);
        assert_relative_eq!(out[4], 40.0);
    }

    #[test]
    fn sma_period_larger_than_input() {
        let out = sma(&[10.0, 20.0], 5);
        assert_eq!(out, vec![0.0, 0.0]);
    }

    #[test]
    fn pct_change_first_is_zero() {
        let out = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.1);
        assert_relative_eq!(out[2], -0.1, max_relative = 1e-12);
    }

    #[test]
    fn pct_change_zero_previous_close() {
        let out = pct_change(&[0.0, 50.0]);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn rsi_warmup_is_zero() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        for v in &out[..14] {
            assert_eq!(*v, 0.0);
        }
        assert!(out[14] != 0.0);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        assert_relative_eq!(out[14], 100.0);
        assert_relative_eq!(out[19], 100.0);
    }

    #[test]
    fn rsi_all_losses_is_zero_strength() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&closes, 14);
        assert_relative_eq!(out[14], 0.0);
    }

    #[test]
    fn rsi_flat_prices_use_default_fill() {
        let closes = vec![100.0; 20];
        let out = rsi(&closes, 14);
        assert_eq!(out[14], 0.0);
    }

    #[test]
    fn rsi_balanced_moves_near_50() {
        // Alternate +1/-1: average gain equals average loss.
        let closes: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let out = rsi(&closes, 14);
        assert_relative_eq!(out[29], 50.0, max_relative = 1e-9);
    }

    #[test]
    fn rsi_stays_in_range() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i * 7) % 13) as f64 - 6.0)
            .collect();
        for v in rsi(&closes, 14) {
            assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let out = ema(&[10.0, 20.0, 30.0], 3);
        assert_relative_eq!(out[0], 10.0);
        let k = 2.0 / 4.0;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        assert_relative_eq!(out[1], e1);
        assert_relative_eq!(out[2], 30.0 * k + e1 * (1.0 - k));
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let out = ema(&[42.0; 10], 5);
        for v in out {
            assert_relative_eq!(v, 42.0);
        }
    }

    #[test]
    fn macd_hist_is_line_minus_signal() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin() * 5.0).collect();
        let (line, signal, hist) = macd(&closes);
        for i in 0..closes.len() {
            assert_relative_eq!(hist[i], line[i] - signal[i], max_relative = 1e-12);
        }
    }

    #[test]
    fn macd_constant_series_is_zero() {
        let (line, signal, hist) = macd(&[100.0; 40]);
        assert_relative_eq!(line[39], 0.0);
        assert_relative_eq!(signal[39], 0.0);
        assert_relative_eq!(hist[39], 0.0);
    }

    #[test]
    fn rolling_std_known_window() {
        // Sample stddev of [2,4,4,4,5,5,7,9] with n-1 denominator.
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_std(&closes, 8);
        let expected = (32.0f64 / 7.0).sqrt();
        assert_relative_eq!(out[7], expected, max_relative = 1e-12);
    }

    #[test]
    fn rolling_std_constant_is_zero() {
        let out = rolling_std(&[5.0; 20], 14);
        assert_relative_eq!(out[19], 0.0);
    }

    #[test]
    fn rolling_std_warmup() {
        let out = rolling_std(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert!(out[2] > 0.0);
    }
}

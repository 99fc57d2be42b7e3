//! Zero-mean / unit-variance feature standardization.

use serde::{Deserialize, Serialize};

use crate::domain::error::CoincastError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and population standard deviation.
    /// Constant columns get std 1.0 so transform leaves them at zero
    /// instead of dividing by zero.
    pub fn fit(matrix: &[Vec<f64>]) -> Result<Self, CoincastError> {
        let n_rows = matrix.len();
        if n_rows == 0 {
            return Err(CoincastError::Training {
                reason: "cannot fit scaler on an empty matrix".into(),
            });
        }
        let n_cols = matrix[0].len();

        let mut means = vec![0.0; n_cols];
        for row in matrix {
            for (j, v) in row.iter().enumerate() {
                means[j] += v;
            }
        }
        for m in &mut means {
            *m /= n_rows as f64;
        }

        let mut stds = vec![0.0; n_cols];
        for row in matrix {
            for (j, v) in row.iter().enumerate() {
                let diff = v - means[j];
                stds[j] += diff * diff;
            }
        }
        for s in &mut stds {
            *s = (*s / n_rows as f64).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { means, stds })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Transform one row with the fitted parameters (never re-fits).
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, CoincastError> {
        if row.len() != self.means.len() {
            return Err(CoincastError::Training {
                reason: format!(
                    "scaler expects {} features, got {}",
                    self.means.len(),
                    row.len()
                ),
            });
        }
        Ok(row
            .iter()
            .enumerate()
            .map(|(j, v)| (v - self.means[j]) / self.stds[j])
            .collect())
    }

    pub fn transform(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, CoincastError> {
        matrix.iter().map(|r| self.transform_row(r)).collect()
    }
}

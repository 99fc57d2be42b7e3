//! RBF-kernel classifier.
//!
//! One-vs-rest kernel ridge regression on ±1 targets: each class gets a
//! dual weight vector solved from (K + λI)α = y via Cholesky, which is
//! valid because the regularized Gram matrix is positive definite. Class
//! scores are squashed through softmax to act as probabilities.

use serde::{Deserialize, Serialize};

use super::decision_tree::uniform;
use super::gradient_boost::softmax;
use crate::domain::error::CoincastError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// RBF width, exp(-gamma * ||a - b||^2).
    pub gamma: f64,
    /// Ridge regularization added to the Gram diagonal.
    pub lambda: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            gamma: 0.1,
            lambda: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelClassifier {
    config: KernelConfig,
    support: Vec<Vec<f64>>,
    /// `alphas[c]` are the dual weights for class c, one per support row.
    alphas: Vec<Vec<f64>>,
    n_classes: usize,
}

impl KernelClassifier {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            support: Vec::new(),
            alphas: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn fit(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
    ) -> Result<(), CoincastError> {
        let n = x.len();
        if n == 0 {
            return Err(CoincastError::Training {
                reason: "kernel classifier needs at least one training row".into(),
            });
        }

        self.n_classes = n_classes;
        self.support = x.to_vec();

        let mut gram = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let k = self.rbf(&x[i], &x[j]);
                gram[i][j] = k;
                gram[j][i] = k;
            }
            gram[i][i] += self.config.lambda;
        }

        let chol = cholesky(&gram).ok_or_else(|| CoincastError::Training {
            reason: "kernel Gram matrix is not positive definite".into(),
        })?;

        self.alphas = (0..n_classes)
            .map(|class| {
                let targets: Vec<f64> = y
                    .iter()
                    .map(|&label| if label == class { 1.0 } else { -1.0 })
                    .collect();
                cholesky_solve(&chol, &targets)
            })
            .collect();

        Ok(())
    }

    fn rbf(&self, a: &[f64], b: &[f64]) -> f64 {
        let sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
        (-self.config.gamma * sq).exp()
    }

    pub fn predict_proba_one(&self, row: &[f64]) -> Vec<f64> {
        if self.support.is_empty() {
            return uniform(self.n_classes);
        }
        let kernels: Vec<f64> = self.support.iter().map(|s| self.rbf(s, row)).collect();
        let scores: Vec<f64> = self
            .alphas
            .iter()
            .map(|alpha| alpha.iter().zip(&kernels).map(|(a, k)| a * k).sum())
            .collect();
        softmax(&scores)
    }

    pub fn n_support(&self) -> usize {
        self.support.len()
    }
}

/// Lower-triangular Cholesky factor, or `None` if the matrix is not
/// positive definite.
fn cholesky(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let d = matrix[i][i] - sum;
                if d <= 0.0 {
                    return None;
                }
                l[i][j] = d.sqrt();
            } else {
                l[i][j] = (matrix[i][j] - sum) / l[j][j];
            }
        }
    }
    Some(l)
}

/// Solve L Lᵀ x = b by forward then backward substitution.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = l.len();

    let mut y = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[i][k] * y[k]).sum();
        y[i] = (b[i] - sum) / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| l[k][i] * x[k]).sum();
        x[i] = (y[i] - sum) / l[i][i];
    }
    x
}

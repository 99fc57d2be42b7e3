//! Feed-forward classifier: two ReLU hidden layers into a softmax head,
//! trained with mini-batch SGD and early stopping on a chronological
//! validation tail.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::decision_tree::uniform;
use super::gradient_boost::softmax;
use crate::domain::error::CoincastError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    pub hidden: Vec<usize>,
    pub learning_rate: f64,
    pub max_epochs: usize,
    pub batch_size: usize,
    /// Fraction of rows held out (from the end) for early stopping.
    pub validation_fraction: f64,
    /// Epochs without validation improvement before stopping.
    pub patience: usize,
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden: vec![32, 16],
            learning_rate: 0.01,
            max_epochs: 200,
            batch_size: 32,
            validation_fraction: 0.1,
            patience: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DenseLayer {
    /// Row-major `[out][in]` weights.
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

impl DenseLayer {
    fn new(n_in: usize, n_out: usize, rng: &mut ChaCha8Rng) -> Self {
        // Xavier initialization.
        let scale = (2.0 / (n_in + n_out) as f64).sqrt();
        let normal = Normal::new(0.0, scale).expect("finite std");
        Self {
            weights: (0..n_out)
                .map(|_| (0..n_in).map(|_| normal.sample(rng)).collect())
                .collect(),
            biases: vec![0.0; n_out],
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNet {
    config: MlpConfig,
    layers: Vec<DenseLayer>,
    n_classes: usize,
}

impl NeuralNet {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            layers: Vec::new(),
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
        if n < 4 {
            return Err(CoincastError::Training {
                reason: format!("network needs at least 4 rows, got {n}"),
            });
        }

        self.n_classes = n_classes;
        let n_features = x[0].len();

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut sizes = vec![n_features];
        sizes.extend(&self.config.hidden);
        sizes.push(n_classes);
        self.layers = sizes
            .windows(2)
            .map(|pair| DenseLayer::new(pair[0], pair[1], &mut rng))
            .collect();

        // Chronological validation tail, never shuffled into training.
        let n_val = ((n as f64 * self.config.validation_fraction) as usize).min(n - 1);
        let n_train = n - n_val;

        let mut best_layers = self.layers.clone();
        let mut best_loss = f64::INFINITY;
        let mut stale_epochs = 0;

        let mut order: Vec<usize> = (0..n_train).collect();
        for _epoch in 0..self.config.max_epochs {
            order.shuffle(&mut rng);

            for batch in order.chunks(self.config.batch_size.max(1)) {
                self.sgd_step(x, y, batch);
            }

            let val_loss = if n_val > 0 {
                self.mean_loss(&x[n_train..], &y[n_train..])
            } else {
                self.mean_loss(&x[..n_train], &y[..n_train])
            };

            if val_loss + 1e-6 < best_loss {
                best_loss = val_loss;
                best_layers = self.layers.clone();
                stale_epochs = 0;
            } else {
                stale_epochs += 1;
                if stale_epochs >= self.config.patience {
                    break;
                }
            }
        }

        self.layers = best_layers;
        Ok(())
    }

    fn sgd_step(&mut self, x: &[Vec<f64>], y: &[usize], batch: &[usize]) {
        let lr = self.config.learning_rate / batch.len() as f64;

        for &i in batch {
            // Forward pass, keeping post-activation outputs per layer.
            let mut activations: Vec<Vec<f64>> = vec![x[i].clone()];
            let last = self.layers.len() - 1;
            for (l, layer) in self.layers.iter().enumerate() {
                let mut z = layer.forward(activations.last().expect("nonempty"));
                if l < last {
                    for v in &mut z {
                        *v = v.max(0.0); // ReLU
                    }
                }
                activations.push(z);
            }

            // Output delta: softmax probability minus one-hot target.
            let probs = softmax(&activations[last + 1]);
            let mut delta: Vec<f64> = probs
                .iter()
                .enumerate()
                .map(|(c, p)| p - if c == y[i] { 1.0 } else { 0.0 })
                .collect();

            for l in (0..self.layers.len()).rev() {
                let input = &activations[l];

                let prev_delta: Vec<f64> = if l > 0 {
                    (0..input.len())
                        .map(|j| {
                            let grad: f64 = self.layers[l]
                                .weights
                                .iter()
                                .zip(&delta)
                                .map(|(row, d)| row[j] * d)
                                .sum();
                            // ReLU derivative on the hidden activation.
                            if input[j] > 0.0 { grad } else { 0.0 }
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                let layer = &mut self.layers[l];
                for (row, &d) in layer.weights.iter_mut().zip(&delta) {
                    for (w, &a) in row.iter_mut().zip(input) {
                        *w -= lr * d * a;
                    }
                }
                for (b, &d) in layer.biases.iter_mut().zip(&delta) {
                    *b -= lr * d;
                }

                delta = prev_delta;
            }
        }
    }

    fn mean_loss(&self, x: &[Vec<f64>], y: &[usize]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let total: f64 = x
            .iter()
            .zip(y)
            .map(|(row, &label)| {
                let p = self.predict_proba_one(row)[label].max(1e-12);
                -p.ln()
            })
            .sum();
        total / x.len() as f64
    }

    pub fn predict_proba_one(&self, row: &[f64]) -> Vec<f64> {
        if self.layers.is_empty() {
            return uniform(self.n_classes);
        }
        let last = self.layers.len() - 1;
        let mut current = row.to_vec();
        for (l, layer) in self.layers.iter().enumerate() {
            current = layer.forward(&current);
            if l < last {
                for v in &mut current {
                    *v = v.max(0.0);
                }
            }
        }
        softmax(&current)
    }
}

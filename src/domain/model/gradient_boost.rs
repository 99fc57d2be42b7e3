//! Softmax gradient boosting.
//!
//! One regression tree per class per round, each fit to the negative
//! gradient of the cross-entropy loss (one-hot target minus current
//! softmax probability). Row subsampling is seeded so fits reproduce.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::decision_tree::{uniform, DecisionTree, TreeConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostConfig {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of rows sampled per round, (0, 1].
    pub subsample: f64,
    pub seed: u64,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoost {
    config: BoostConfig,
    /// `rounds[r][c]` is the round-r tree for class c.
    rounds: Vec<Vec<DecisionTree>>,
    n_classes: usize,
}

impl GradientBoost {
    pub fn new(config: BoostConfig) -> Self {
        Self {
            config,
            rounds: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize) {
        self.n_classes = n_classes;
        self.rounds.clear();

        let n = x.len();
        if n == 0 {
            return;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut scores = vec![vec![0.0; n_classes]; n];

        for round in 0..self.config.n_rounds {
            let sampled = self.sample_rows(n, &mut rng);
            let sx: Vec<Vec<f64>> = sampled.iter().map(|&i| x[i].clone()).collect();

            let mut class_trees = Vec::with_capacity(n_classes);
            for class in 0..n_classes {
                // Negative gradient on the sampled rows.
                let residuals: Vec<f64> = sampled
                    .iter()
                    .map(|&i| {
                        let target = if y[i] == class { 1.0 } else { 0.0 };
                        target - softmax(&scores[i])[class]
                    })
                    .collect();

                let mut tree = DecisionTree::new(TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: 5,
                    min_samples_leaf: 2,
                    max_features: None,
                    seed: self
                        .config
                        .seed
                        .wrapping_add((round * n_classes + class) as u64),
                });
                tree.fit_regression(&sx, &residuals);
                class_trees.push(tree);
            }

            for (i, row_scores) in scores.iter_mut().enumerate() {
                for (class, tree) in class_trees.iter().enumerate() {
                    row_scores[class] +=
                        self.config.learning_rate * tree.predict_value_one(&x[i]);
                }
            }

            self.rounds.push(class_trees);
        }
    }

    fn sample_rows(&self, n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let k = ((n as f64 * self.config.subsample) as usize).clamp(1, n);
        if k == n {
            return (0..n).collect();
        }
        (0..k).map(|_| rng.gen_range(0..n)).collect()
    }

    pub fn predict_proba_one(&self, row: &[f64]) -> Vec<f64> {
        if self.rounds.is_empty() {
            return uniform(self.n_classes);
        }
        let mut scores = vec![0.0; self.n_classes];
        for class_trees in &self.rounds {
            for (class, tree) in class_trees.iter().enumerate() {
                scores[class] += self.config.learning_rate * tree.predict_value_one(row);
            }
        }
        softmax(&scores)
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }
}

/// Numerically stable softmax.
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::decision_tree::argmax;
    use approx::assert_relative_eq;

    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..90 {
            let v = i as f64 / 10.0;
            x.push(vec![v]);
            y.push(if v < 3.0 {
                0
            } else if v < 6.0 {
                1
            } else {
                2
            });
        }
        (x, y)
    }

    #[test]
    fn softmax_is_a_distribution() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn softmax_survives_large_scores() {
        let p = softmax(&[1000.0, 1000.0, -1000.0]);
        assert!(p.iter().all(|v| v.is_finite()));
        assert_relative_eq!(p[0], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn boosting_learns_a_separable_problem() {
        let (x, y) = separable();
        let mut gbm = GradientBoost::new(BoostConfig {
            n_rounds: 30,
            learning_rate: 0.3,
            ..Default::default()
        });
        gbm.fit(&x, &y, 3);
        assert_eq!(gbm.n_rounds(), 30);

        let correct = x
            .iter()
            .zip(&y)
            .filter(|&(row, &label)| argmax(&gbm.predict_proba_one(row)) == label)
            .count();
        assert!(correct as f64 / x.len() as f64 > 0.9);
    }

    #[test]
    fn empty_fit_predicts_uniform() {
        let mut gbm = GradientBoost::new(BoostConfig::default());
        gbm.fit(&[], &[], 3);
        assert_eq!(gbm.predict_proba_one(&[0.0]), vec![1.0 / 3.0; 3]);
    }

    #[test]
    fn seeded_fits_are_reproducible() {
        let (x, y) = separable();
        let config = BoostConfig {
            n_rounds: 10,
            subsample: 0.8,
            seed: 5,
            ..Default::default()
        };
        let mut a = GradientBoost::new(config.clone());
        let mut b = GradientBoost::new(config);
        a.fit(&x, &y, 3);
        b.fit(&x, &y, 3);
        for row in x.iter().take(10) {
            assert_eq!(a.predict_proba_one(row), b.predict_proba_one(row));
        }
    }
}

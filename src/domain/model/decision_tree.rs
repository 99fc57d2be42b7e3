//! CART decision tree over standardized feature rows.
//!
//! Classification trees split on gini impurity and keep per-class
//! frequencies in their leaves; regression trees split on variance and
//! keep the leaf mean. The regression flavor exists for the boosting
//! stages, which fit trees to residuals.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all of them.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        /// Class frequencies for classification, `[mean]` for regression.
        values: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<Node>,
    n_classes: usize,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_classes: 0,
        }
    }

    /// Fit a classification tree on encoded labels.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize) {
        self.n_classes = n_classes;
        let targets: Vec<f64> = y.iter().map(|&c| c as f64).collect();
        let indices: Vec<usize> = (0..x.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build(x, &targets, &indices, 0, false, &mut rng));
    }

    /// Fit a regression tree on continuous targets.
    pub fn fit_regression(&mut self, x: &[Vec<f64>], y: &[f64]) {
        self.n_classes = 0;
        let indices: Vec<usize> = (0..x.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build(x, y, &indices, 0, true, &mut rng));
    }

    fn build(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        depth: usize,
        regression: bool,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let impurity = self.impurity(y, indices, regression);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity < 1e-10
        {
            return self.leaf(y, indices, regression);
        }

        let Some((feature, threshold, left_idx, right_idx)) =
            self.best_split(x, y, indices, impurity, regression, rng)
        else {
            return self.leaf(y, indices, regression);
        };

        if left_idx.len() < self.config.min_samples_leaf
            || right_idx.len() < self.config.min_samples_leaf
        {
            return self.leaf(y, indices, regression);
        }

        let left = self.build(x, y, &left_idx, depth + 1, regression, rng);
        let right = self.build(x, y, &right_idx, depth + 1, regression, rng);
        Node::Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn leaf(&self, y: &[f64], indices: &[usize], regression: bool) -> Node {
        if regression {
            let mean = if indices.is_empty() {
                0.0
            } else {
                indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
            };
            return Node::Leaf { values: vec![mean] };
        }

        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[y[i] as usize] += 1.0;
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for c in &mut counts {
                *c /= total;
            }
        }
        Node::Leaf { values: counts }
    }

    fn impurity(&self, y: &[f64], indices: &[usize], regression: bool) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let n = indices.len() as f64;

        if regression {
            let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n;
            return indices.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f64>() / n;
        }

        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[y[i] as usize] += 1.0;
        }
        1.0 - counts.iter().map(|c| (c / n).powi(2)).sum::<f64>()
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        parent_impurity: f64,
        regression: bool,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>)> {
        let n_features = x[indices[0]].len();
        let max_features = self.config.max_features.unwrap_or(n_features).min(n_features);

        let mut feature_order: Vec<usize> = (0..n_features).collect();
        feature_order.shuffle(rng);
        feature_order.truncate(max_features);

        let mut best_gain = 0.0;
        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>)> = None;

        for &feature in &feature_order {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[i][feature]).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[i][feature] <= threshold);
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let n_left = left.len() as f64;
                let n_right = right.len() as f64;
                let weighted = (n_left * self.impurity(y, &left, regression)
                    + n_right * self.impurity(y, &right, regression))
                    / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, threshold, left, right));
                }
            }
        }

        best
    }

    /// Leaf class frequencies for one standardized row.
    pub fn predict_proba_one(&self, row: &[f64]) -> Vec<f64> {
        match &self.root {
            Some(node) => Self::descend(node, row).to_vec(),
            None => uniform(self.n_classes),
        }
    }

    /// Regression prediction for one row.
    pub fn predict_value_one(&self, row: &[f64]) -> f64 {
        match &self.root {
            Some(node) => Self::descend(node, row)[0],
            None => 0.0,
        }
    }

    fn descend<'a>(node: &'a Node, row: &[f64]) -> &'a [f64] {
        match node {
            Node::Leaf { values } => values,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    Self::descend(left, row)
                } else {
                    Self::descend(right, row)
                }
            }
        }
    }
}

pub(crate) fn uniform(n_classes: usize) -> Vec<f64> {
    if n_classes == 0 {
        return Vec::new();
    }
    vec![1.0 / n_classes as f64; n_classes]
}

pub(crate) fn argmax(probs: &[f64]) -> usize {
    probs
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

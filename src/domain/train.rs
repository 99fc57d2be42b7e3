//! Model selection pipeline.
//!
//! Chronological train/test split, per-family hyperparameter search
//! under forward-chaining
//! cross-validation, then a soft-voting ensemble over everything that
//! trained. All candidates are scored by accuracy on the held-out test
//! slice and the best one wins. A family that fails to train is skipped
//! and reported; training only fails outright when nothing trains.

use serde::{Deserialize, Serialize};

use crate::domain::cv::{select_rows, time_series_split};
use crate::domain::dataset::{split_index, Dataset, FEATURE_NAMES};
use crate::domain::encoder::LabelEncoder;
use crate::domain::error::CoincastError;
use crate::domain::label::Signal;
use crate::domain::metrics::{accuracy, classification_report, confusion_matrix, ClassReport};
use crate::domain::model::ensemble::{EnsembleMember, VotingEnsemble};
use crate::domain::model::gradient_boost::{BoostConfig, GradientBoost};
use crate::domain::model::kernel::{KernelClassifier, KernelConfig};
use crate::domain::model::neural::{MlpConfig, NeuralNet};
use crate::domain::model::random_forest::{ForestConfig, RandomForest};
use crate::domain::model::TrainedModel;
use crate::domain::scaler::StandardScaler;

#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Chronological share of rows used for training, (0, 1).
    pub train_fraction: f64,
    pub cv_splits: usize,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            cv_splits: 5,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub name: String,
    pub test_accuracy: f64,
    pub model: TrainedModel,
}

/// Mean next-bar return observed on test rows per predicted signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRow {
    pub signal: Signal,
    pub mean_next_day_return: f64,
    pub n_predictions: usize,
}

#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub confusion: Vec<Vec<usize>>,
    pub report: Vec<ClassReport>,
    pub backtest: Vec<BacktestRow>,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub best_name: String,
    pub candidates: Vec<CandidateResult>,
    pub skipped: Vec<(String, String)>,
    pub scaler: StandardScaler,
    pub encoder: LabelEncoder,
    pub feature_names: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl TrainingOutcome {
    pub fn best(&self) -> &CandidateResult {
        self.candidates
            .iter()
            .find(|c| c.name == self.best_name)
            .expect("best_name always names a candidate")
    }
}

pub fn train(dataset: &Dataset, config: &TrainConfig) -> Result<TrainingOutcome, CoincastError> {
    let n = dataset.len();
    let split = split_index(n, config.train_fraction);
    if split == 0 || split >= n {
        return Err(CoincastError::Training {
            reason: format!("{n} rows cannot be split {}/{}", split, n - split),
        });
    }

    let encoder = LabelEncoder::fit(&dataset.labels);
    let n_classes = encoder.n_classes();
    let y = encoder.encode_all(&dataset.labels);

    let scaler = StandardScaler::fit(&dataset.matrix)?;
    let x = scaler.transform(&dataset.matrix)?;

    let (x_train, y_train) = (&x[..split], &y[..split]);
    let (x_test, y_test) = (&x[split..], &y[split..]);

    let mut candidates = Vec::new();
    let mut skipped = Vec::new();

    for family in candidate_families(config) {
        match (family.fit)(x_train, y_train, n_classes, config.cv_splits) {
            Ok(model) => {
                let preds: Vec<usize> = x_test.iter().map(|row| model.predict_one(row)).collect();
                candidates.push(CandidateResult {
                    name: family.name.to_string(),
                    test_accuracy: accuracy(y_test, &preds),
                    model,
                });
            }
            Err(e) => skipped.push((family.name.to_string(), e.to_string())),
        }
    }

    if candidates.is_empty() {
        return Err(CoincastError::NoTrainedModel);
    }

    // Soft vote over every base model that trained.
    let members: Vec<EnsembleMember> = candidates
        .iter()
        .map(|c| EnsembleMember {
            name: c.name.clone(),
            model: c.model.clone(),
        })
        .collect();
    let voting = TrainedModel::Voting(VotingEnsemble::new(members, n_classes));
    let preds: Vec<usize> = x_test.iter().map(|row| voting.predict_one(row)).collect();
    candidates.push(CandidateResult {
        name: "voting_ensemble".to_string(),
        test_accuracy: accuracy(y_test, &preds),
        model: voting,
    });

    let best_name = candidates
        .iter()
        .max_by(|a, b| a.test_accuracy.total_cmp(&b.test_accuracy))
        .map(|c| c.name.clone())
        .expect("candidates is nonempty");

    let best = candidates
        .iter()
        .find(|c| c.name == best_name)
        .expect("best_name is drawn from candidates");
    let best_preds: Vec<usize> = x_test.iter().map(|row| best.model.predict_one(row)).collect();

    let diagnostics = Diagnostics {
        confusion: confusion_matrix(y_test, &best_preds, n_classes),
        report: classification_report(y_test, &best_preds, n_classes),
        backtest: backtest_summary(&encoder, &best_preds, &dataset.next_day_returns[split..]),
    };

    Ok(TrainingOutcome {
        best_name,
        candidates,
        skipped,
        scaler,
        encoder,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        diagnostics,
    })
}

type FitFn = Box<dyn Fn(&[Vec<f64>], &[usize], usize, usize) -> Result<TrainedModel, CoincastError>>;

struct CandidateFamily {
    name: &'static str,
    fit: FitFn,
}

fn candidate_families(config: &TrainConfig) -> Vec<CandidateFamily> {
    let seed = config.seed;
    vec![
        CandidateFamily {
            name: "random_forest",
            fit: Box::new(move |x, y, n_classes, cv_splits| {
                let grid: Vec<ForestConfig> =
                    [(50, 5, 5), (50, 10, 5), (100, 5, 5), (100, 10, 2)]
                        .into_iter()
                        .map(|(n_trees, max_depth, min_samples_split)| ForestConfig {
                            n_trees,
                            max_depth,
                            min_samples_split,
                            seed,
                            ..Default::default()
                        })
                        .collect();
                let best = pick_by_cv(x, y, n_classes, cv_splits, &grid, |params, x, y| {
                    let mut forest = RandomForest::new(params.clone());
                    forest.fit(x, y, n_classes);
                    Ok(TrainedModel::RandomForest(forest))
                })?;
                let mut forest = RandomForest::new(best);
                forest.fit(x, y, n_classes);
                Ok(TrainedModel::RandomForest(forest))
            }),
        },
        // Two independent boosted candidates with disjoint grids; both
        // survive to scoring and the ensemble.
        gradient_boost_family(
            "gradient_boost_shallow",
            vec![
                BoostConfig {
                    n_rounds: 150,
                    learning_rate: 0.05,
                    max_depth: 3,
                    subsample: 0.8,
                    seed,
                },
                BoostConfig {
                    n_rounds: 100,
                    learning_rate: 0.05,
                    max_depth: 3,
                    subsample: 1.0,
                    seed,
                },
            ],
        ),
        gradient_boost_family(
            "gradient_boost_deep",
            vec![
                BoostConfig {
                    n_rounds: 100,
                    learning_rate: 0.1,
                    max_depth: 5,
                    subsample: 0.8,
                    seed,
                },
                BoostConfig {
                    n_rounds: 60,
                    learning_rate: 0.2,
                    max_depth: 5,
                    subsample: 1.0,
                    seed,
                },
            ],
        ),
        CandidateFamily {
            name: "kernel",
            fit: Box::new(move |x, y, n_classes, cv_splits| {
                let grid: Vec<KernelConfig> = [0.01, 0.1]
                    .into_iter()
                    .map(|gamma| KernelConfig { gamma, lambda: 1.0 })
                    .collect();
                let best = pick_by_cv(x, y, n_classes, cv_splits, &grid, |params, x, y| {
                    let mut clf = KernelClassifier::new(params.clone());
                    clf.fit(x, y, n_classes)?;
                    Ok(TrainedModel::Kernel(clf))
                })?;
                let mut clf = KernelClassifier::new(best);
                clf.fit(x, y, n_classes)?;
                Ok(TrainedModel::Kernel(clf))
            }),
        },
        CandidateFamily {
            name: "neural",
            fit: Box::new(move |x, y, n_classes, _cv_splits| {
                let mut net = NeuralNet::new(MlpConfig {
                    seed,
                    ..Default::default()
                });
                net.fit(x, y, n_classes)?;
                Ok(TrainedModel::Neural(net))
            }),
        },
    ]
}

fn gradient_boost_family(name: &'static str, grid: Vec<BoostConfig>) -> CandidateFamily {
    CandidateFamily {
        name,
        fit: Box::new(move |x, y, n_classes, cv_splits| {
            let best = pick_by_cv(x, y, n_classes, cv_splits, &grid, |params, x, y| {
                let mut gbm = GradientBoost::new(params.clone());
                gbm.fit(x, y, n_classes);
                Ok(TrainedModel::GradientBoost(gbm))
            })?;
            let mut gbm = GradientBoost::new(best);
            gbm.fit(x, y, n_classes);
            Ok(TrainedModel::GradientBoost(gbm))
        }),
    }
}

/// Pick the grid entry with the best mean forward-chaining CV accuracy.
/// When the training slice is too small to split, the first entry wins.
fn pick_by_cv<P: Clone>(
    x: &[Vec<f64>],
    y: &[usize],
    n_classes: usize,
    cv_splits: usize,
    grid: &[P],
    fit: impl Fn(&P, &[Vec<f64>], &[usize]) -> Result<TrainedModel, CoincastError>,
) -> Result<P, CoincastError> {
    let first = grid.first().cloned().ok_or_else(|| CoincastError::Training {
        reason: "empty hyperparameter grid".into(),
    })?;

    let splits = time_series_split(x.len(), cv_splits);
    if splits.is_empty() {
        return Ok(first);
    }

    let mut best = first;
    let mut best_score = f64::NEG_INFINITY;

    for params in grid {
        let mut total = 0.0;
        let mut folds = 0;
        for split in &splits {
            let fx = select_rows(x, &split.train_indices);
            let fy = select_rows(y, &split.train_indices);
            let model = fit(params, &fx, &fy)?;

            let vx = select_rows(x, &split.test_indices);
            let vy = select_rows(y, &split.test_indices);
            let preds: Vec<usize> = vx.iter().map(|row| model.predict_one(row)).collect();
            total += accuracy(&vy, &preds);
            folds += 1;
        }
        let score = total / folds as f64;
        if score > best_score {
            best_score = score;
            best = params.clone();
        }
    }

    Ok(best)
}

fn backtest_summary(
    encoder: &LabelEncoder,
    predictions: &[usize],
    next_day_returns: &[f64],
) -> Vec<BacktestRow> {
    encoder
        .classes()
        .iter()
        .enumerate()
        .map(|(class, &signal)| {
            let returns: Vec<f64> = predictions
                .iter()
                .zip(next_day_returns)
                .filter(|&(&p, _)| p == class)
                .map(|(_, &r)| r)
                .collect();
            let mean = if returns.is_empty() {
                0.0
            } else {
                returns.iter().sum::<f64>() / returns.len() as f64
            };
            BacktestRow {
                signal,
                mean_next_day_return: mean,
                n_predictions: returns.len(),
            }
        })
        .collect()
}

//! Classifier family. Every model maps a standardized feature row to a
//! probability vector over the encoded classes; [`TrainedModel`] is the
//! serialized form the artifact store persists and reloads.

pub mod decision_tree;
pub mod ensemble;
pub mod gradient_boost;
pub mod kernel;
pub mod neural;
pub mod random_forest;

use serde::{Deserialize, Serialize};

pub(crate) use decision_tree::argmax;
use ensemble::VotingEnsemble;
use gradient_boost::GradientBoost;
use kernel::KernelClassifier;
use neural::NeuralNet;
use random_forest::RandomForest;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TrainedModel {
    RandomForest(RandomForest),
    GradientBoost(GradientBoost),
    Kernel(KernelClassifier),
    Neural(NeuralNet),
    Voting(VotingEnsemble),
}

impl TrainedModel {
    pub fn predict_proba_one(&self, row: &[f64]) -> Vec<f64> {
        match self {
            Self::RandomForest(m) => m.predict_proba_one(row),
            Self::GradientBoost(m) => m.predict_proba_one(row),
            Self::Kernel(m) => m.predict_proba_one(row),
            Self::Neural(m) => m.predict_proba_one(row),
            Self::Voting(m) => m.predict_proba_one(row),
        }
    }

    /// Index of the most probable class.
    pub fn predict_one(&self, row: &[f64]) -> usize {
        argmax(&self.predict_proba_one(row))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::GradientBoost(_) => "gradient_boost",
            Self::Kernel(_) => "kernel",
            Self::Neural(_) => "neural",
            Self::Voting(_) => "voting",
        }
    }
}

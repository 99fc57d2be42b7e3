//! Soft-voting ensemble: averages member probability vectors.

use serde::{Deserialize, Serialize};

use super::decision_tree::uniform;
use super::TrainedModel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleMember {
    pub name: String,
    pub model: TrainedModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingEnsemble {
    pub members: Vec<EnsembleMember>,
    n_classes: usize,
}

impl VotingEnsemble {
    pub fn new(members: Vec<EnsembleMember>, n_classes: usize) -> Self {
        Self { members, n_classes }
    }

    pub fn predict_proba_one(&self, row: &[f64]) -> Vec<f64> {
        if self.members.is_empty() {
            return uniform(self.n_classes);
        }
        let mut acc = vec![0.0; self.n_classes];
        for member in &self.members {
            for (a, p) in acc.iter_mut().zip(member.model.predict_proba_one(row)) {
                *a += p;
            }
        }
        let n = self.members.len() as f64;
        for a in &mut acc {
            *a /= n;
        }
        acc
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::kernel::{KernelClassifier, KernelConfig};
    use approx::assert_relative_eq;

    fn fitted_kernel(shift: f64) -> TrainedModel {
        let x = vec![vec![0.0 + shift], vec![1.0 + shift], vec![2.0 + shift]];
        let y = vec![0, 1, 2];
        let mut clf = KernelClassifier::new(KernelConfig {
            gamma: 1.0,
            lambda: 0.1,
        });
        clf.fit(&x, &y, 3).unwrap();
        TrainedModel::Kernel(clf)
    }

    #[test]
    fn vote_is_the_mean_of_member_probabilities() {
        let a = fitted_kernel(0.0);
        let b = fitted_kernel(0.5);
        let pa = a.predict_proba_one(&[1.0]);
        let pb = b.predict_proba_one(&[1.0]);

        let ensemble = VotingEnsemble::new(
            vec![
                EnsembleMember {
                    name: "a".into(),
                    model: a,
                },
                EnsembleMember {
                    name: "b".into(),
                    model: b,
                },
            ],
            3,
        );

        let p = ensemble.predict_proba_one(&[1.0]);
        for c in 0..3 {
            assert_relative_eq!(p[c], (pa[c] + pb[c]) / 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_ensemble_is_uniform() {
        let ensemble = VotingEnsemble::new(Vec::new(), 3);
        assert_eq!(ensemble.predict_proba_one(&[0.0]), vec![1.0 / 3.0; 3]);
    }
}

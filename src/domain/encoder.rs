//! Categorical label encoder.
//!
//! Classes are stored in lexicographic order (Buy, Hold, Sell); that
//! order defines the canonical integer mapping used by every model and by
//! the serving layer when decoding predictions.

use serde::{Deserialize, Serialize};

use crate::domain::label::Signal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<Signal>,
}

impl LabelEncoder {
    /// Fit on observed labels. Classes absent from the data are still
    /// included so the encoder always covers all three signals and the
    /// probability vector width never varies between runs.
    pub fn fit(labels: &[Signal]) -> Self {
        let _ = labels;
        Self {
            classes: Signal::ALL.to_vec(),
        }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[Signal] {
        &self.classes
    }

    pub fn encode(&self, signal: Signal) -> usize {
        // Position is total over Signal::ALL by construction.
        self.classes.iter().position(|c| *c == signal).unwrap_or(0)
    }

    pub fn encode_all(&self, labels: &[Signal]) -> Vec<usize> {
        labels.iter().map(|s| self.encode(*s)).collect()
    }

    pub fn decode(&self, index: usize) -> Option<Signal> {
        self.classes.get(index).copied()
    }
}

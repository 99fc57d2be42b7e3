//! Trained artifact persistence.
//!
//! A training run leaves behind `best_model.json`, `scaler.json`,
//! `label_encoder.json`, `features.txt` and one JSON file per candidate
//! under `candidates/`. Loading is all-or-nothing: a bundle with any
//! piece missing or unreadable never serves predictions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::encoder::LabelEncoder;
use crate::domain::error::CoincastError;
use crate::domain::predict::ArtifactBundle;
use crate::domain::scaler::StandardScaler;
use crate::domain::train::{CandidateResult, TrainingOutcome};

pub const BEST_MODEL_FILE: &str = "best_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const ENCODER_FILE: &str = "label_encoder.json";
pub const FEATURES_FILE: &str = "features.txt";
pub const CANDIDATES_DIR: &str = "candidates";

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn save(&self, outcome: &TrainingOutcome) -> Result<(), CoincastError> {
        fs::create_dir_all(self.dir.join(CANDIDATES_DIR))?;

        write_json(&self.dir.join(BEST_MODEL_FILE), outcome.best())?;
        write_json(&self.dir.join(SCALER_FILE), &outcome.scaler)?;
        write_json(&self.dir.join(ENCODER_FILE), &outcome.encoder)?;
        fs::write(
            self.dir.join(FEATURES_FILE),
            outcome.feature_names.join("\n") + "\n",
        )?;

        for candidate in &outcome.candidates {
            write_json(
                &self
                    .dir
                    .join(CANDIDATES_DIR)
                    .join(format!("{}.json", candidate.name)),
                candidate,
            )?;
        }
        Ok(())
    }

    pub fn load(&self) -> Result<ArtifactBundle, CoincastError> {
        let best: CandidateResult = read_json(&self.dir.join(BEST_MODEL_FILE))?;
        let scaler: StandardScaler = read_json(&self.dir.join(SCALER_FILE))?;
        let encoder: LabelEncoder = read_json(&self.dir.join(ENCODER_FILE))?;

        let features_path = self.dir.join(FEATURES_FILE);
        let features = fs::read_to_string(&features_path).map_err(|_| {
            CoincastError::ArtifactMissing {
                path: features_path.display().to_string(),
            }
        })?;
        let feature_names: Vec<String> = features
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if feature_names.is_empty() {
            return Err(CoincastError::ArtifactCorrupt {
                path: features_path.display().to_string(),
                reason: "no feature names listed".into(),
            });
        }

        Ok(ArtifactBundle {
            model: best.model,
            scaler,
            encoder,
            feature_names,
        })
    }

    /// Whether a complete-looking bundle exists, without parsing it.
    pub fn exists(&self) -> bool {
        [BEST_MODEL_FILE, SCALER_FILE, ENCODER_FILE, FEATURES_FILE]
            .iter()
            .all(|f| self.dir.join(f).exists())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CoincastError> {
    let json = serde_json::to_string(value).map_err(|e| CoincastError::ArtifactCorrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoincastError> {
    let content = fs::read_to_string(path).map_err(|_| CoincastError::ArtifactMissing {
        path: path.display().to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| CoincastError::ArtifactCorrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Dataset;
    use crate::domain::label::Signal;
    use crate::domain::train::{train, TrainConfig};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn trained_outcome() -> TrainingOutcome {
        let n = 120;
        let labels: Vec<Signal> = (0..n)
            .map(|i| match (i / 4) % 3 {
                0 => Signal::Buy,
                1 => Signal::Hold,
                _ => Signal::Sell,
            })
            .collect();
        let matrix: Vec<Vec<f64>> = labels
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let v = match s {
                    Signal::Buy => 1.0,
                    Signal::Hold => 0.0,
                    Signal::Sell => -1.0,
                } + (i % 4) as f64 * 0.01;
                let mut row = vec![v];
                row.extend(vec![0.5; 13]);
                row
            })
            .collect();
        let dataset = Dataset {
            dates: (0..n)
                .map(|i| {
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
                })
                .collect(),
            matrix,
            labels,
            next_day_returns: vec![0.0; n],
        };
        train(
            &dataset,
            &TrainConfig {
                cv_splits: 2,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let outcome = trained_outcome();

        store.save(&outcome).unwrap();
        assert!(store.exists());

        let bundle = store.load().unwrap();
        assert_eq!(bundle.feature_names, outcome.feature_names);
        assert_eq!(bundle.model.kind(), outcome.best().model.kind());

        let row = vec![0.0; bundle.feature_names.len()];
        let scaled = bundle.scaler.transform_row(&row).unwrap();
        assert_eq!(
            bundle.model.predict_proba_one(&scaled),
            outcome.best().model.predict_proba_one(&scaled)
        );
    }

    #[test]
    fn every_candidate_gets_its_own_file() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let outcome = trained_outcome();
        store.save(&outcome).unwrap();

        for candidate in &outcome.candidates {
            assert!(dir
                .path()
                .join(CANDIDATES_DIR)
                .join(format!("{}.json", candidate.name))
                .exists());
        }
    }

    #[test]
    fn missing_piece_fails_the_whole_load() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let outcome = trained_outcome();
        store.save(&outcome).unwrap();

        fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();
        assert!(!store.exists());
        assert!(matches!(
            store.load(),
            Err(CoincastError::ArtifactMissing { .. })
        ));
    }

    #[test]
    fn corrupt_json_is_reported_as_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let outcome = trained_outcome();
        store.save(&outcome).unwrap();

        fs::write(dir.path().join(ENCODER_FILE), "{not json").unwrap();
        assert!(matches!(
            store.load(),
            Err(CoincastError::ArtifactCorrupt { .. })
        ));
    }

    #[test]
    fn empty_store_reports_missing() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        assert!(!store.exists());
        assert!(matches!(
            store.load(),
            Err(CoincastError::ArtifactMissing { .. })
        ));
    }
}

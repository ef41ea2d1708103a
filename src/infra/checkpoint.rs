// ============================================================
// Layer 6 — Checkpoint Store
// ============================================================
// Saves and restores model weights with Burn's named MessagePack
// recorder at full precision, so a restored model reproduces the
// saved model's predictions exactly.
//
// Layout (default directory: model/rnn/):
//   model.mpk            ← every trainable parameter
//   model_config.json    ← dimensions needed to rebuild the model
//   latest_epoch.json    ← epoch of the last save
//
// Each save overwrites the previous one: there is no versioning.
// The directory is created on save if it is missing; failing to
// create or write it is an error for the caller, never retried.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::ml::model::{RnnClassifier, RnnClassifierConfig};

pub const DEFAULT_CHECKPOINT_DIR: &str = "model/rnn/";

/// Base filename of the weights file; the recorder appends the extension
const MODEL_FILE:  &str = "model";
const CONFIG_FILE: &str = "model_config.json";
const EPOCH_FILE:  &str = "latest_epoch.json";

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write weights, configuration and epoch pointer.
    pub fn save<B: Backend>(
        &self,
        model:  &RnnClassifier<B>,
        config: &RnnClassifierConfig,
        epoch:  usize,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))?;

        let path = self.dir.join(MODEL_FILE);
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.save_config(config)?;

        let epoch_path = self.dir.join(EPOCH_FILE);
        fs::write(&epoch_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", epoch_path.display()))?;

        tracing::debug!("Saved checkpoint: epoch {} → '{}'", epoch, self.dir.display());
        Ok(())
    }

    /// Load the saved weights into `model`, which must already have the
    /// checkpoint's architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  RnnClassifier<B>,
        device: &B::Device,
    ) -> Result<RnnClassifier<B>> {
        let path = self.dir.join(MODEL_FILE);
        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, config: &RnnClassifierConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<RnnClassifierConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'test'.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed model config '{}'", path.display()))
    }

    /// Epoch of the most recent save.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(EPOCH_FILE);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_DIR)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn config() -> RnnClassifierConfig {
        RnnClassifierConfig::new(10, 4, 3, 2, 0.01)
    }

    #[test]
    fn test_save_creates_nested_directory() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(tmp.path().join("model").join("rnn"));
        let model = config().init::<TestBackend>(&Default::default());

        store.save(&model, &config(), 3).unwrap();

        assert!(store.dir().join("model.mpk").exists());
        assert_eq!(store.latest_epoch().unwrap(), 3);
        assert_eq!(store.load_config().unwrap().num_hidden, 3);
    }

    #[test]
    fn test_weights_round_trip() {
        let tmp    = tempfile::tempdir().unwrap();
        let store  = CheckpointStore::new(tmp.path());
        let device = Default::default();
        let saved  = config().init::<TestBackend>(&device);
        store.save(&saved, &config(), 1).unwrap();

        let fresh  = config().with_seed(7).init::<TestBackend>(&device);
        let loaded = store.load_model(fresh, &device).unwrap();

        assert_eq!(
            saved.embedding.weight.val().into_data().to_vec::<f32>().unwrap(),
            loaded.embedding.weight.val().into_data().to_vec::<f32>().unwrap(),
        );
    }

    #[test]
    fn test_unwritable_directory_is_an_error() {
        let tmp     = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();

        let store = CheckpointStore::new(blocker.join("rnn"));
        let model = config().init::<TestBackend>(&Default::default());
        let err   = store.save(&model, &config(), 1).unwrap_err();
        assert!(format!("{err:#}").contains("Cannot create checkpoint directory"));
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(tmp.path());
        assert!(store.load_config().is_err());
        assert!(store.latest_epoch().is_err());
    }
}

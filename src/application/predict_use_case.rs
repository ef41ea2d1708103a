// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Restores the model from its checkpoint and predicts a class
// for every row of an unlabeled id file:
//
//   Step 1: Load the saved architecture + weights   (Layer 6)
//   Step 2: Read the id rows                        (Layer 4)
//   Step 3: Predict in batches, dropout disabled    (Layer 5)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::loader::read_id_rows;
use crate::domain::sample::Batch;
use crate::infra::checkpoint::{CheckpointStore, DEFAULT_CHECKPOINT_DIR};
use crate::ml::context::{ExecutionContext, TrainBackend};
use crate::ml::controller::ModelController;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    pub input:          String,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub max_seq_len:    Option<usize>,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            input:          "data/predict.txt".to_string(),
            checkpoint_dir: DEFAULT_CHECKPOINT_DIR.to_string(),
            batch_size:     64,
            max_seq_len:    None,
        }
    }
}

pub struct PredictUseCase {
    config: PredictConfig,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    /// One predicted class per input row, in file order.
    pub fn execute(&self) -> Result<Vec<usize>> {
        let cfg = &self.config;

        // ── Step 1: Model ────────────────────────────────────────────────────
        let store     = CheckpointStore::new(&cfg.checkpoint_dir);
        let model_cfg = store.load_config()?;
        let context   = ExecutionContext::<TrainBackend>::new(Default::default(), model_cfg.seed);
        let mut controller = ModelController::new(model_cfg, context, store);
        controller.restore()?;

        // ── Step 2: Input ────────────────────────────────────────────────────
        let rows = read_id_rows(&cfg.input, cfg.max_seq_len)?;
        tracing::info!("Predicting {} rows from '{}'", rows.len(), cfg.input);

        // ── Step 3: Predict ──────────────────────────────────────────────────
        let mut predictions = Vec::with_capacity(rows.len());
        for chunk in rows.chunks(cfg.batch_size.max(1)) {
            // labels are not read by predict; class 0 always passes validation
            let batch = Batch::from_rows(chunk.to_vec(), vec![0; chunk.len()])?;
            predictions.extend(controller.predict(&batch)?);
        }
        Ok(predictions)
    }
}

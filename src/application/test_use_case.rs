// ============================================================
// Layer 2 — TestUseCase
// ============================================================
// Rebuilds the model from the checkpoint directory and runs one
// evaluation pass over the test split. The architecture comes
// from the saved model_config.json, so only data parameters are
// needed on the command line.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::loader::TsvCorpus;
use crate::infra::{
    checkpoint::{CheckpointStore, DEFAULT_CHECKPOINT_DIR},
    metrics::{ConsoleSink, MetricsLogger},
};
use crate::ml::context::{ExecutionContext, TrainBackend};
use crate::ml::controller::{ModelController, TestSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub max_seq_len:    Option<usize>,
    pub metrics_csv:    Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data".to_string(),
            checkpoint_dir: DEFAULT_CHECKPOINT_DIR.to_string(),
            batch_size:     64,
            max_seq_len:    None,
            metrics_csv:    None,
        }
    }
}

pub struct TestUseCase {
    config: TestConfig,
}

impl TestUseCase {
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TestSummary> {
        let cfg = &self.config;

        let store     = CheckpointStore::new(&cfg.checkpoint_dir);
        let model_cfg = store.load_config()?;
        let context   = ExecutionContext::<TrainBackend>::new(Default::default(), model_cfg.seed);

        let mut controller = ModelController::new(model_cfg, context, store);
        controller.restore()?;

        let corpus = TsvCorpus::new(&cfg.data_dir, cfg.batch_size)
            .with_max_seq_len(cfg.max_seq_len);
        let csv = cfg.metrics_csv.as_ref().map(MetricsLogger::new).transpose()?;
        let mut sink = ConsoleSink::new(csv);

        println!("\nbegin test ....\n");
        controller.test(&corpus, &mut sink)
    }
}

// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Runs the training pipeline in order:
//
//   Step 1: Open the TSV corpus             (Layer 4 - data)
//   Step 2: Build the execution context     (Layer 5 - ml)
//   Step 3: Initialise the model            (Layer 5 - ml)
//   Step 4: Train, checkpoint every epoch   (Layer 5 + 6)
//   Step 5: Evaluate on the test split      (Layer 5 - ml)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::loader::TsvCorpus;
use crate::infra::{
    checkpoint::{CheckpointStore, DEFAULT_CHECKPOINT_DIR},
    metrics::{ConsoleSink, MetricsLogger},
};
use crate::ml::context::{ExecutionContext, TrainBackend};
use crate::ml::controller::{ModelController, TestSummary, TrainSummary};
use crate::ml::model::{KeepProb, RnnClassifierConfig};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub learning_rate:  f64,
    /// Dropout keep-probability used while training
    pub keep_prob:      f64,
    pub vocab_size:     usize,
    pub embedding_size: usize,
    pub num_hidden:     usize,
    pub num_classes:    usize,
    pub max_seq_len:    Option<usize>,
    pub shuffle:        bool,
    pub seed:           u64,
    pub metrics_csv:    Option<String>,
    pub run_test:       bool,
}

impl TrainConfig {
    pub fn model_config(&self) -> RnnClassifierConfig {
        RnnClassifierConfig::new(
            self.vocab_size, self.embedding_size, self.num_hidden,
            self.num_classes, self.learning_rate,
        )
        .with_seed(self.seed)
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data".to_string(),
            checkpoint_dir: DEFAULT_CHECKPOINT_DIR.to_string(),
            batch_size:     64,
            epochs:         10,
            learning_rate:  1e-3,
            keep_prob:      0.5,
            vocab_size:     10_000,
            embedding_size: 128,
            num_hidden:     128,
            num_classes:    2,
            max_seq_len:    None,
            shuffle:        false,
            seed:           42,
            metrics_csv:    None,
            run_test:       true,
        }
    }
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<(TrainSummary, Option<TestSummary>)> {
        let cfg = &self.config;

        // ── Step 1: Data provider ────────────────────────────────────────────
        let corpus = TsvCorpus::new(&cfg.data_dir, cfg.batch_size)
            .with_max_seq_len(cfg.max_seq_len)
            .with_shuffle(cfg.shuffle, cfg.seed);
        tracing::info!("Reading data from '{}'", cfg.data_dir);

        // ── Step 2-3: Context + model ────────────────────────────────────────
        let context = ExecutionContext::<TrainBackend>::new(Default::default(), cfg.seed);
        let store   = CheckpointStore::new(&cfg.checkpoint_dir);
        let keep_prob = KeepProb::new(cfg.keep_prob)?;
        let mut controller = ModelController::new(cfg.model_config(), context, store)
            .with_train_keep_prob(keep_prob);
        controller.initialize();

        let csv = cfg.metrics_csv.as_ref().map(MetricsLogger::new).transpose()?;
        let mut sink = ConsoleSink::new(csv);

        // ── Step 4: Train ────────────────────────────────────────────────────
        println!("\nbegin train ....\n");
        let train_summary = controller.train(&corpus, cfg.epochs, &mut sink)?;

        // ── Step 5: Test ─────────────────────────────────────────────────────
        let test_summary = if cfg.run_test {
            println!("\nbegin test ....\n");
            Some(controller.test(&corpus, &mut sink)?)
        } else {
            None
        };

        Ok((train_summary, test_summary))
    }
}

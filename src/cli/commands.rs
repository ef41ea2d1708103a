// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `test`, and their flags.
//
// Data layout expected in --data-dir:
//   train.tsv, test.tsv  — one `<label>\t<id> <id> ...` per line

use clap::{Args, Subcommand};
use crate::application::predict_use_case::PredictConfig;
use crate::application::test_use_case::TestConfig;
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a fresh model, checkpoint every epoch, then evaluate it
    Train(TrainArgs),

    /// Evaluate the model saved in a checkpoint directory
    Test(TestArgs),

    /// Predict a class for every row of an unlabeled id file
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing train.tsv and test.tsv
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory the checkpoint is written to after every epoch
    #[arg(long, default_value = "model/rnn/")]
    pub checkpoint_dir: String,

    /// Number of sequences per batch
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Dropout keep-probability while training, in (0, 1]
    #[arg(long, default_value_t = 0.5)]
    pub keep_prob: f64,

    /// Number of distinct token ids, padding id 0 included
    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    /// Width of each token embedding
    #[arg(long, default_value_t = 128)]
    pub embedding_size: usize,

    /// Hidden size of each LSTM direction
    #[arg(long, default_value_t = 128)]
    pub num_hidden: usize,

    /// Number of target classes
    #[arg(long, default_value_t = 2)]
    pub num_classes: usize,

    /// Truncate sequences longer than this
    #[arg(long)]
    pub max_seq_len: Option<usize>,

    /// Shuffle the training samples on every epoch
    #[arg(long)]
    pub shuffle: bool,

    /// Seed for parameter initialisation, dropout and shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Append every progress record to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<String>,

    /// Skip the evaluation pass after training
    #[arg(long)]
    pub skip_test: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            learning_rate:  a.lr,
            keep_prob:      a.keep_prob,
            vocab_size:     a.vocab_size,
            embedding_size: a.embedding_size,
            num_hidden:     a.num_hidden,
            num_classes:    a.num_classes,
            max_seq_len:    a.max_seq_len,
            shuffle:        a.shuffle,
            seed:           a.seed,
            metrics_csv:    a.metrics_csv,
            run_test:       !a.skip_test,
        }
    }
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// Directory containing test.tsv
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory where training saved its checkpoint
    #[arg(long, default_value = "model/rnn/")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Truncate sequences longer than this
    #[arg(long)]
    pub max_seq_len: Option<usize>,

    /// Append every progress record to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<String>,
}

impl From<TestArgs> for TestConfig {
    fn from(a: TestArgs) -> Self {
        TestConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            max_seq_len:    a.max_seq_len,
            metrics_csv:    a.metrics_csv,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// File with one space-separated id row per line
    #[arg(long)]
    pub input: String,

    /// Directory where training saved its checkpoint
    #[arg(long, default_value = "model/rnn/")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Truncate sequences longer than this
    #[arg(long)]
    pub max_seq_len: Option<usize>,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            input:          a.input,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            max_seq_len:    a.max_seq_len,
        }
    }
}

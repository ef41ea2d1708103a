// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `train` — trains a model, checkpoints it, evaluates it
//   2. `test`  — restores a checkpoint and evaluates it
//   3. `predict` — restores a checkpoint and labels unlabeled rows

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TestArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "birnn-classify",
    version,
    about = "Train and evaluate a bidirectional LSTM sequence classifier."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Test(args)  => run_test(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on data in: {}", args.data_dir);

    let use_case = TrainUseCase::new(args.into());
    let (train, test) = use_case.execute()?;

    println!(
        "\nTraining complete: {} iterations, {} examples. Checkpoint saved.",
        train.iterations, train.examples,
    );
    if let Some(loss) = train.epoch_losses.last() {
        println!("Final epoch mean loss: {loss:.3}");
    }
    if let Some(test) = test {
        println!(
            "Test: loss={:.3} acc={:.3} over {} examples in {} iterations",
            test.loss, test.accuracy, test.examples, test.iterations,
        );
    }
    Ok(())
}

fn run_test(args: TestArgs) -> Result<()> {
    use crate::application::test_use_case::TestUseCase;

    let summary = TestUseCase::new(args.into()).execute()?;
    println!(
        "\nTest: loss={:.3} acc={:.3} over {} examples in {} iterations",
        summary.loss, summary.accuracy, summary.examples, summary.iterations,
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let predictions = PredictUseCase::new(args.into()).execute()?;
    for (row, class) in predictions.iter().enumerate() {
        println!("{}\t{}", row + 1, class);
    }
    Ok(())
}

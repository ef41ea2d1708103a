// ============================================================
// Layer 5 — Model Controller
// ============================================================
// Owns the model, its execution context and its checkpoint
// store, and drives the train and test loops.
//
//   Uninitialized ──initialize()/restore()──▶ Initialized
//                                               │
//                       train() ◀───────────────┼──────────▶ test()
//
// train: per epoch, one pass over the training batches; each
//        batch gets forward (keep 0.5) + loss + one Adam step;
//        a progress record per batch; a checkpoint per epoch.
// test:  one pass over the test batches, forward (keep 1.0),
//        no update, no checkpoint.
//
// Evaluation runs on model.valid(), i.e. the inner backend,
// so no autodiff graph is recorded.

use anyhow::{anyhow, Result};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::ClassifyBatcher;
use crate::domain::error::ClassifierError;
use crate::domain::progress::{Phase, ProgressRecord};
use crate::domain::sample::{Batch, Mode};
use crate::domain::traits::{BatchSource, ProgressSink};
use crate::infra::checkpoint::CheckpointStore;
use crate::ml::context::ExecutionContext;
use crate::ml::model::{KeepProb, RnnClassifier, RnnClassifierConfig};
use crate::ml::objective::{adam, apply_gradients, StepMetrics};

/// Outcome of one `train` call.
#[derive(Debug, Clone, Default)]
pub struct TrainSummary {
    pub iterations:  usize,
    pub examples:    usize,
    /// Mean batch loss per epoch, in epoch order (NaN for an epoch without batches)
    pub epoch_losses: Vec<f64>,
}

/// Outcome of one `test` call.
#[derive(Debug, Clone, Default)]
pub struct TestSummary {
    pub iterations: usize,
    pub examples:   usize,
    /// Example-weighted mean loss over every batch (NaN without examples)
    pub loss:       f64,
    /// Example-weighted accuracy over every batch (NaN without examples)
    pub accuracy:   f64,
}

pub struct ModelController<B: AutodiffBackend> {
    config:  RnnClassifierConfig,
    context: ExecutionContext<B>,
    store:   CheckpointStore,
    model:   Option<RnnClassifier<B>>,
    /// Keep-probability of the dropout layer during `train`
    train_keep_prob: KeepProb,
}

impl<B: AutodiffBackend> ModelController<B> {
    /// Build an uninitialised controller. Call `initialize` or `restore` next.
    pub fn new(config: RnnClassifierConfig, context: ExecutionContext<B>, store: CheckpointStore) -> Self {
        Self { config, context, store, model: None, train_keep_prob: KeepProb::TRAIN }
    }

    pub fn with_train_keep_prob(mut self, keep_prob: KeepProb) -> Self {
        self.train_keep_prob = keep_prob;
        self
    }

    /// Give every parameter its initial value. Running it again throws
    /// away whatever was learned so far.
    pub fn initialize(&mut self) {
        self.context.reseed();
        self.model = Some(self.config.init(self.context.device()));
        tracing::info!(
            "Model ready: vocab={} embedding={} hidden={} classes={}",
            self.config.vocab_size, self.config.embedding_size,
            self.config.num_hidden, self.config.num_classes,
        );
    }

    /// Load parameters from the checkpoint store. The saved dimensions must
    /// match this controller's configuration.
    pub fn restore(&mut self) -> Result<()> {
        let saved = self.store.load_config()?;
        self.config.check_compatible(&saved)?;

        let device = self.context.device();
        let model  = self.store.load_model(self.config.init(device), device)?;
        self.model = Some(model);
        tracing::info!(
            "Model restored from '{}' (epoch {})",
            self.store.dir().display(), self.store.latest_epoch()?,
        );
        Ok(())
    }

    /// Train for `epochs` passes over `source`'s training batches.
    ///
    /// Optimiser moments live for the duration of this call.
    pub fn train(
        &mut self,
        source: &dyn BatchSource,
        epochs: usize,
        sink:   &mut dyn ProgressSink,
    ) -> Result<TrainSummary> {
        let mut model = self.model.take().ok_or(ClassifierError::NotInitialized)?;
        let outcome   = self.train_epochs(&mut model, source, epochs, sink);
        // Keep whatever was learned even if a later step failed
        self.model = Some(model);
        outcome
    }

    fn train_epochs(
        &self,
        model:  &mut RnnClassifier<B>,
        source: &dyn BatchSource,
        epochs: usize,
        sink:   &mut dyn ProgressSink,
    ) -> Result<TrainSummary> {
        let limits  = self.config.limits();
        let batcher = ClassifyBatcher::<B>::new(self.context.device().clone(), self.config.pad_id);
        let mut optim = adam::<B, RnnClassifier<B>>();
        let mut summary = TrainSummary::default();

        tracing::info!("Begin training: {} epochs", epochs);

        for epoch in 1..=epochs {
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;

            for batch in source.batches(Mode::Train)? {
                let batch = batch?;
                batch.validate(&limits)?;

                let metrics = self.train_step(model, &mut optim, &batcher, &batch);

                summary.iterations += 1;
                summary.examples   += batch.len();
                loss_sum += metrics.loss;
                batches  += 1;

                sink.record(&ProgressRecord {
                    phase:      Phase::Train,
                    epoch,
                    iteration:  summary.iterations,
                    examples:   summary.examples,
                    loss:       metrics.loss,
                    accuracy:   metrics.accuracy,
                })?;
            }

            let mean_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
            summary.epoch_losses.push(mean_loss);

            self.store.save(model, &self.config, epoch)?;
            tracing::info!("Epoch {} done (mean loss {:.4}); checkpoint saved", epoch, mean_loss);
        }

        tracing::info!("Training complete!");
        Ok(summary)
    }

    fn train_step<O>(
        &self,
        model:   &mut RnnClassifier<B>,
        optim:   &mut O,
        batcher: &ClassifyBatcher<B>,
        batch:   &Batch,
    ) -> StepMetrics
    where
        O: Optimizer<RnnClassifier<B>, B>,
    {
        let step    = model.forward_step(batcher.tensorize(batch), self.train_keep_prob);
        let metrics = step.metrics();
        *model = apply_gradients(optim, self.config.learning_rate, model.clone(), step.loss);
        metrics
    }

    /// Evaluate every test batch once, without touching the parameters.
    pub fn test(&self, source: &dyn BatchSource, sink: &mut dyn ProgressSink) -> Result<TestSummary> {
        let model   = self.model.as_ref().ok_or(ClassifierError::NotInitialized)?.valid();
        let limits  = self.config.limits();
        let batcher = ClassifyBatcher::<B::InnerBackend>::new(
            self.context.device().clone(), self.config.pad_id,
        );

        let mut summary  = TestSummary::default();
        let mut loss_sum = 0.0f64;
        let mut correct  = 0.0f64;

        tracing::info!("Begin test");

        for batch in source.batches(Mode::Test)? {
            let batch = batch?;
            batch.validate(&limits)?;

            let metrics = model
                .forward_step(batcher.tensorize(&batch), KeepProb::EVAL)
                .metrics();

            summary.iterations += 1;
            summary.examples   += batch.len();
            loss_sum += metrics.loss * batch.len() as f64;
            correct  += metrics.accuracy * batch.len() as f64;

            sink.record(&ProgressRecord {
                phase:      Phase::Test,
                epoch:      0,
                iteration:  summary.iterations,
                examples:   summary.examples,
                loss:       metrics.loss,
                accuracy:   metrics.accuracy,
            })?;
        }

        if summary.examples > 0 {
            summary.loss     = loss_sum / summary.examples as f64;
            summary.accuracy = correct  / summary.examples as f64;
        } else {
            summary.loss     = f64::NAN;
            summary.accuracy = f64::NAN;
        }

        tracing::info!(
            "Test complete: {} examples, loss={:.4}, acc={:.4}",
            summary.examples, summary.loss, summary.accuracy,
        );
        Ok(summary)
    }

    /// Predicted class per row, with dropout disabled.
    pub fn predict(&self, batch: &Batch) -> Result<Vec<usize>> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotInitialized)?.valid();
        batch.validate(&self.config.limits())?;

        let batcher = ClassifyBatcher::<B::InnerBackend>::new(
            self.context.device().clone(), self.config.pad_id,
        );
        let output = model.forward(batcher.tensorize(batch).input_ids, KeepProb::EVAL);

        let predictions = output
            .predictions
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| anyhow!("Cannot read predictions: {e:?}"))?;
        Ok(predictions.into_iter().map(|p| p as usize).collect())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::data::dataset::InMemorySource;
    use crate::domain::sample::ClassifySample;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn small_config() -> RnnClassifierConfig {
        RnnClassifierConfig::new(10, 4, 3, 2, 0.01)
    }

    fn controller(dir: &std::path::Path, config: RnnClassifierConfig) -> ModelController<TestBackend> {
        let context = ExecutionContext::<TestBackend>::new(Default::default(), config.seed);
        ModelController::new(config, context, CheckpointStore::new(dir))
    }

    /// Class 0 sequences use ids 1..=4, class 1 sequences use ids 5..=8.
    fn synthetic_samples() -> Vec<ClassifySample> {
        vec![
            ClassifySample::new(vec![1, 2, 3], 0),
            ClassifySample::new(vec![5, 6, 7, 8], 1),
            ClassifySample::new(vec![4, 1], 0),
            ClassifySample::new(vec![8, 5], 1),
            ClassifySample::new(vec![2, 3, 4, 1], 0),
            ClassifySample::new(vec![7], 1),
            ClassifySample::new(vec![3], 0),
            ClassifySample::new(vec![6, 8, 7], 1),
        ]
    }

    fn scenario_batch() -> Batch {
        Batch::from_rows(vec![vec![1, 2, 3, 0], vec![4, 5, 0, 0]], vec![0, 1]).unwrap()
    }

    #[test]
    fn test_uninitialized_controller_refuses_work() {
        let tmp    = tempfile::tempdir().unwrap();
        let mut c  = controller(tmp.path(), small_config());
        let source = InMemorySource::new(synthetic_samples(), synthetic_samples(), 4);
        let mut records: Vec<ProgressRecord> = Vec::new();

        let err = c.train(&source, 1, &mut records).unwrap_err();
        assert_eq!(err.downcast_ref::<ClassifierError>(), Some(&ClassifierError::NotInitialized));
        assert!(c.test(&source, &mut records).is_err());
        assert!(c.predict(&scenario_batch()).is_err());
        assert!(c.model.is_none());
    }

    #[test]
    fn test_predict_end_to_end_scenario() {
        let tmp   = tempfile::tempdir().unwrap();
        let mut c = controller(tmp.path(), small_config());
        c.initialize();

        let predictions = c.predict(&scenario_batch()).unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|&p| p < 2));
    }

    #[test]
    fn test_train_records_and_checkpoints_every_epoch() {
        let tmp    = tempfile::tempdir().unwrap();
        let dir    = tmp.path().join("model").join("rnn");
        let mut c  = controller(&dir, small_config());
        let source = InMemorySource::new(synthetic_samples(), Vec::new(), 3);
        let mut records: Vec<ProgressRecord> = Vec::new();
        c.initialize();

        let summary = c.train(&source, 2, &mut records).unwrap();

        // 8 samples in batches of 3 → 3 iterations per epoch
        assert_eq!(summary.iterations, 6);
        assert_eq!(summary.examples, 16);
        assert_eq!(summary.epoch_losses.len(), 2);
        assert_eq!(records.len(), 6);

        let last = records.last().unwrap();
        assert_eq!((last.epoch, last.iteration, last.examples), (2, 6, 16));
        assert!(records.iter().all(|r| r.phase == Phase::Train && r.loss > 0.0));

        assert!(dir.join("model.mpk").exists());
        assert_eq!(c.store.latest_epoch().unwrap(), 2);
    }

    #[test]
    fn test_test_pass_reports_without_updating() {
        let tmp    = tempfile::tempdir().unwrap();
        let mut c  = controller(tmp.path(), small_config());
        let source = InMemorySource::new(Vec::new(), synthetic_samples(), 4);
        let mut records: Vec<ProgressRecord> = Vec::new();
        c.initialize();

        let before  = c.predict(&scenario_batch()).unwrap();
        let summary = c.test(&source, &mut records).unwrap();
        let after   = c.predict(&scenario_batch()).unwrap();

        assert_eq!(before, after);
        assert_eq!(summary.iterations, 2);
        assert_eq!(summary.examples, 8);
        assert!(summary.loss > 0.0);
        assert!((0.0..=1.0).contains(&summary.accuracy));
        assert!(records.iter().all(|r| r.phase == Phase::Test && r.epoch == 0));
        // no checkpoint writes during test
        assert!(!tmp.path().join("model.mpk").exists());
    }

    #[test]
    fn test_empty_test_pass_reports_nan() {
        let tmp    = tempfile::tempdir().unwrap();
        let mut c  = controller(tmp.path(), small_config());
        let source = InMemorySource::new(Vec::new(), Vec::new(), 4);
        let mut records: Vec<ProgressRecord> = Vec::new();
        c.initialize();

        let summary = c.test(&source, &mut records).unwrap();
        assert_eq!(summary.examples, 0);
        assert!(summary.loss.is_nan());
        assert!(summary.accuracy.is_nan());
        assert!(records.is_empty());
    }

    #[test]
    fn test_training_lowers_average_loss() {
        let tmp    = tempfile::tempdir().unwrap();
        let config = RnnClassifierConfig::new(10, 8, 8, 2, 0.01);
        let mut c  = controller(tmp.path(), config);
        let source = InMemorySource::new(synthetic_samples(), Vec::new(), 4);
        let mut records: Vec<ProgressRecord> = Vec::new();
        c.initialize();

        let losses = c.train(&source, 40, &mut records).unwrap().epoch_losses;

        let head: f64 = losses[..5].iter().sum::<f64>() / 5.0;
        let tail: f64 = losses[losses.len() - 5..].iter().sum::<f64>() / 5.0;
        assert!(tail < head, "loss did not decrease: first epochs {head:.4}, last epochs {tail:.4}");
    }

    #[test]
    fn test_checkpoint_round_trip_reproduces_predictions() {
        let tmp    = tempfile::tempdir().unwrap();
        let source = InMemorySource::new(synthetic_samples(), Vec::new(), 4);
        let mut records: Vec<ProgressRecord> = Vec::new();

        let mut trained = controller(tmp.path(), small_config());
        trained.initialize();
        trained.train(&source, 3, &mut records).unwrap();
        let batch    = Batch::new(synthetic_samples());
        let expected = trained.predict(&batch).unwrap();

        let mut restored = controller(tmp.path(), small_config().with_seed(99));
        restored.restore().unwrap();
        assert_eq!(restored.predict(&batch).unwrap(), expected);
    }

    #[test]
    fn test_restore_rejects_mismatched_dimensions() {
        let tmp    = tempfile::tempdir().unwrap();
        let source = InMemorySource::new(synthetic_samples(), Vec::new(), 8);
        let mut records: Vec<ProgressRecord> = Vec::new();

        let mut trained = controller(tmp.path(), small_config());
        trained.initialize();
        trained.train(&source, 1, &mut records).unwrap();

        let mut other = controller(tmp.path(), RnnClassifierConfig::new(10, 4, 5, 2, 0.01));
        let err = other.restore().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ClassifierError>(),
            Some(&ClassifierError::ConfigMismatch { field: "num_hidden", saved: 3, current: 5 }),
        );
        assert!(other.model.is_none());
    }

    #[test]
    fn test_contract_violations_are_fatal() {
        let tmp   = tempfile::tempdir().unwrap();
        let mut c = controller(tmp.path(), small_config());
        let mut records: Vec<ProgressRecord> = Vec::new();
        c.initialize();

        let bad_token = InMemorySource::new(vec![ClassifySample::new(vec![1, 10], 0)], Vec::new(), 1);
        let err = c.train(&bad_token, 1, &mut records).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::TokenOutOfRange { id: 10, .. })
        ));

        let empty_row = Batch::from_rows(vec![vec![0, 0]], vec![0]).unwrap();
        let err = c.predict(&empty_row).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::EmptySequence { row: 0 })
        ));

        let bad_label = InMemorySource::new(Vec::new(), vec![ClassifySample::new(vec![1], 5)], 1);
        let err = c.test(&bad_label, &mut records).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::LabelOutOfRange { label: 5, .. })
        ));

        // the model survives a failed train call
        assert!(c.model.is_some());
    }

    #[test]
    fn test_training_without_dropout_is_reproducible() {
        let tmp    = tempfile::tempdir().unwrap();
        let source = InMemorySource::new(synthetic_samples(), Vec::new(), 4);
        let mut records: Vec<ProgressRecord> = Vec::new();

        let mut weights = Vec::new();
        for run in ["a", "b"] {
            let mut c = controller(&tmp.path().join(run), small_config())
                .with_train_keep_prob(KeepProb::EVAL);
            c.initialize();
            c.train(&source, 2, &mut records).unwrap();
            weights.push(c.model.as_ref().unwrap().output.weight.val().into_data().to_vec::<f32>().unwrap());
        }
        assert_eq!(weights[0], weights[1]);
    }

    #[test]
    fn test_initialize_resets_parameters() {
        let tmp    = tempfile::tempdir().unwrap();
        let mut c  = controller(tmp.path(), small_config());
        let source = InMemorySource::new(synthetic_samples(), Vec::new(), 4);
        let mut records: Vec<ProgressRecord> = Vec::new();

        c.initialize();
        let initial = c.model.as_ref().unwrap().output.weight.val().into_data().to_vec::<f32>().unwrap();
        c.train(&source, 1, &mut records).unwrap();
        let trained = c.model.as_ref().unwrap().output.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_ne!(initial, trained);

        c.initialize();
        let reset = c.model.as_ref().unwrap().output.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(initial, reset);
    }
}

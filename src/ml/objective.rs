// ============================================================
// Layer 5 — Training Objective
// ============================================================
// Loss     = mean sparse softmax cross-entropy over the batch
// Accuracy = mean(prediction == label), a value in [0, 1]
// Update   = one Adam step on every trainable parameter
//
// Adam (Kingma & Ba, 2015):
//   m = β1*m + (1-β1)*g        (mean)
//   v = β2*v + (1-β2)*g²       (variance)
//   θ = θ - lr * m / (√v + ε)  (update)
//
// No gradient clipping and no learning-rate schedule.

use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::ClassifyBatch;
use crate::ml::model::{KeepProb, RnnClassifier};

/// Loss and accuracy of one step, still on the backend.
pub struct StepOutput<B: Backend> {
    pub loss:     Tensor<B, 1>,
    pub accuracy: Tensor<B, 1>,
}

impl<B: Backend> StepOutput<B> {
    /// Pull loss and accuracy back to the host.
    pub fn metrics(&self) -> StepMetrics {
        StepMetrics {
            loss:     self.loss.clone().into_scalar().elem::<f64>(),
            accuracy: self.accuracy.clone().into_scalar().elem::<f64>(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMetrics {
    pub loss:     f64,
    pub accuracy: f64,
}

/// logits: [batch, classes], labels: [batch] → scalar mean loss.
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, labels)
}

pub fn accuracy<B: Backend>(predictions: Tensor<B, 1, Int>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    predictions.equal(labels).float().mean()
}

impl<B: Backend> RnnClassifier<B> {
    /// Forward pass plus loss and accuracy against the batch labels.
    pub fn forward_step(&self, batch: ClassifyBatch<B>, keep_prob: KeepProb) -> StepOutput<B> {
        let output   = self.forward(batch.input_ids, keep_prob);
        let loss     = cross_entropy(output.logits, batch.labels.clone());
        let accuracy = accuracy(output.predictions, batch.labels);
        StepOutput { loss, accuracy }
    }
}

/// Adam with β1 = 0.9, β2 = 0.999, ε = 1e-8.
pub fn adam<B: AutodiffBackend, M: AutodiffModule<B>>() -> impl Optimizer<M, B> {
    AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-8)
        .init::<B, M>()
}

/// Backpropagate `loss` and take one optimiser step.
pub fn apply_gradients<B, M, O>(optim: &mut O, learning_rate: f64, model: M, loss: Tensor<B, 1>) -> M
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    let grads = loss.backward();
    let grads = GradientsParams::from_grads(grads, &model);
    optim.step(learning_rate, model, grads)
}

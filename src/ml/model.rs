use burn::{
    module::Param,
    nn::{DropoutConfig, Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig},
    prelude::*,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::domain::error::ClassifierError;
use crate::domain::sample::{BatchLimits, PAD_ID};
use crate::ml::encoder::{last_valid_step, BiEncoder, BiEncoderConfig};
use crate::ml::init::truncated_normal_param;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct RnnClassifierConfig {
    pub vocab_size:     usize,
    pub embedding_size: usize,
    pub num_hidden:     usize,
    pub num_classes:    usize,
    pub learning_rate:  f64,
    /// Padding id; never a real token
    #[config(default = "PAD_ID")]
    pub pad_id:         u32,
    /// Stddev of the truncated-normal embedding and output weights
    #[config(default = 0.1)]
    pub init_std:       f64,
    /// Seed for the host-side initialisers and the backend RNG
    #[config(default = 42)]
    pub seed:           u64,
}

impl RnnClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> RnnClassifier<B> {
        let mut rng  = StdRng::seed_from_u64(self.seed);
        let features = 2 * self.num_hidden;

        let mut embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_size).init(device);
        embedding.weight = truncated_normal_param(
            [self.vocab_size, self.embedding_size], 0.0, self.init_std, &mut rng, device,
        );

        let encoder = BiEncoderConfig::new(self.embedding_size, self.num_hidden).init(device);

        let mut dense = LinearConfig::new(features, features)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);
        dense.bias = Some(Param::from_tensor(Tensor::zeros([features], device)));

        let mut output = LinearConfig::new(features, self.num_classes).init(device);
        output.weight = truncated_normal_param(
            [features, self.num_classes], 0.0, self.init_std, &mut rng, device,
        );
        output.bias = Some(Param::from_tensor(Tensor::zeros([self.num_classes], device)));

        RnnClassifier { embedding, encoder, dense, output, pad_id: self.pad_id }
    }

    pub fn limits(&self) -> BatchLimits {
        BatchLimits {
            vocab_size:  self.vocab_size,
            num_classes: self.num_classes,
            pad_id:      self.pad_id,
        }
    }

    /// A checkpoint can only be loaded into a model with identical dimensions.
    pub fn check_compatible(&self, saved: &RnnClassifierConfig) -> Result<(), ClassifierError> {
        let fields = [
            ("vocab_size",     saved.vocab_size,     self.vocab_size),
            ("embedding_size", saved.embedding_size, self.embedding_size),
            ("num_hidden",     saved.num_hidden,     self.num_hidden),
            ("num_classes",    saved.num_classes,    self.num_classes),
        ];
        for (field, saved, current) in fields {
            if saved != current {
                return Err(ClassifierError::ConfigMismatch { field, saved, current });
            }
        }
        Ok(())
    }
}

/// Fraction of dense activations kept by dropout on one forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeepProb(f64);

impl KeepProb {
    /// Used for every training step
    pub const TRAIN: KeepProb = KeepProb(0.5);
    /// Dropout disabled
    pub const EVAL: KeepProb = KeepProb(1.0);

    pub fn new(p: f64) -> Result<Self, ClassifierError> {
        if p > 0.0 && p <= 1.0 {
            Ok(Self(p))
        } else {
            Err(ClassifierError::InvalidKeepProb(p))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

#[derive(Module, Debug)]
pub struct RnnClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub encoder:   BiEncoder<B>,
    pub dense:     Linear<B>,
    pub output:    Linear<B>,
    pub pad_id:    u32,
}

pub struct ClassifierOutput<B: Backend> {
    /// [batch, num_classes]
    pub logits:      Tensor<B, 2>,
    /// [batch] argmax of the logits
    pub predictions: Tensor<B, 1, Int>,
}

impl<B: Backend> RnnClassifier<B> {
    /// input_ids: [batch, seq] right-padded → logits [batch, num_classes].
    ///
    /// Every row must contain at least one non-padding id and every id
    /// must be inside the vocabulary; `Batch::validate` checks both.
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, keep_prob: KeepProb) -> ClassifierOutput<B> {
        let lengths  = sequence_lengths(input_ids.clone(), self.pad_id);
        let embedded = self.embedding.forward(input_ids); // [batch, seq, embedding]

        let encoded = self.encoder.forward(embedded, lengths.clone()).concat();
        let last    = last_valid_step(encoded, lengths); // [batch, 2H]

        let hidden = self.dense.forward(last).tanh();
        let hidden = dropout(hidden, keep_prob);
        let logits = self.output.forward(hidden);

        // argmax(1) returns [batch, 1]
        let predictions = logits.clone().argmax(1).flatten::<1>(0, 1);

        ClassifierOutput { logits, predictions }
    }
}

/// Count of non-padding ids per row: [batch, seq] → [batch].
pub fn sequence_lengths<B: Backend>(input_ids: Tensor<B, 2, Int>, pad_id: u32) -> Tensor<B, 1, Int> {
    input_ids
        .equal_elem(pad_id as i64)
        .bool_not()
        .int()
        .sum_dim(1)
        .flatten::<1>(0, 1)
}

/// Zero each activation with probability `1 - keep` and scale the survivors
/// by `1 / keep`. Burn's dropout is a no-op on a backend without autodiff,
/// so evaluation through `valid()` never drops anything.
fn dropout<B: Backend>(x: Tensor<B, 2>, keep_prob: KeepProb) -> Tensor<B, 2> {
    DropoutConfig::new(1.0 - keep_prob.value()).init().forward(x)
}

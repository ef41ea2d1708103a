// ============================================================
// Layer 3 — Samples and Batches
// ============================================================
// A sample is one integer-encoded sequence with its class label.
// A batch is an ordered group of samples that is fed to the model
// in a single forward pass.
//
// Rows inside a batch may have different lengths; the batcher pads
// them to the longest row with the padding id. The true length of
// a row is the number of non-padding ids it contains.

use serde::{Deserialize, Serialize};

use crate::domain::error::ClassifierError;

/// Token id reserved for padding. Real tokens must never use it.
pub const PAD_ID: u32 = 0;

/// Which split the data provider should serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Train,
    Test,
}

impl Mode {
    /// Short lowercase name, also used as the data file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Test  => "test",
        }
    }
}

/// One integer-encoded sequence and its class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifySample {
    pub token_ids: Vec<u32>,
    pub label:     usize,
}

impl ClassifySample {
    pub fn new(token_ids: Vec<u32>, label: usize) -> Self {
        Self { token_ids, label }
    }

    /// Number of non-padding ids in the row.
    ///
    /// Any padding id counts as padding wherever it appears, so a real
    /// token that was encoded as the padding id shortens the sequence.
    pub fn sequence_length(&self, pad_id: u32) -> usize {
        self.token_ids.iter().filter(|&&id| id != pad_id).count()
    }
}

/// Bounds a batch must respect before it reaches the model.
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    pub vocab_size:  usize,
    pub num_classes: usize,
    pub pad_id:      u32,
}

/// A group of samples consumed by exactly one training or evaluation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub samples: Vec<ClassifySample>,
}

impl Batch {
    pub fn new(samples: Vec<ClassifySample>) -> Self {
        Self { samples }
    }

    /// Build a batch from parallel id rows and labels.
    pub fn from_rows(rows: Vec<Vec<u32>>, labels: Vec<usize>) -> Result<Self, ClassifierError> {
        if rows.len() != labels.len() {
            return Err(ClassifierError::RowLabelMismatch {
                rows:   rows.len(),
                labels: labels.len(),
            });
        }
        let samples = rows
            .into_iter()
            .zip(labels)
            .map(|(token_ids, label)| ClassifySample::new(token_ids, label))
            .collect();
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check the data-provider contract: non-empty batch, every id inside
    /// the vocabulary, every row with at least one real token, every label
    /// a valid class index.
    pub fn validate(&self, limits: &BatchLimits) -> Result<(), ClassifierError> {
        if self.is_empty() {
            return Err(ClassifierError::EmptyBatch);
        }

        for (row, sample) in self.samples.iter().enumerate() {
            if let Some((position, &id)) = sample
                .token_ids
                .iter()
                .enumerate()
                .find(|(_, &id)| id as usize >= limits.vocab_size)
            {
                return Err(ClassifierError::TokenOutOfRange {
                    row,
                    position,
                    id,
                    vocab_size: limits.vocab_size,
                });
            }

            if sample.sequence_length(limits.pad_id) == 0 {
                return Err(ClassifierError::EmptySequence { row });
            }

            if sample.label >= limits.num_classes {
                return Err(ClassifierError::LabelOutOfRange {
                    row,
                    label:       sample.label,
                    num_classes: limits.num_classes,
                });
            }
        }

        Ok(())
    }
}

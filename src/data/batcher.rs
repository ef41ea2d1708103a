// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<ClassifySample>
// into tensors.
//
// Rows are padded on the right with the padding id up to the
// longest row in the batch, so different batches may have
// different widths:
//
//   [[5, 7, 2], [4, 1]]  →  input_ids [[5, 7, 2], [4, 1, 0]]
//
// The model recovers the true lengths from the padding itself.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::{Batch, ClassifySample};

/// A batch ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ClassifyBatch<B: Backend> {
    /// Token ids — shape: [batch_size, max_seq_len], right-padded
    pub input_ids: Tensor<B, 2, Int>,

    /// Class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ClassifyBatcher<B: Backend> {
    pub device: B::Device,
    pub pad_id: u32,
}

impl<B: Backend> ClassifyBatcher<B> {
    pub fn new(device: B::Device, pad_id: u32) -> Self {
        Self { device, pad_id }
    }

    /// Tensorise a domain batch without consuming it.
    pub fn tensorize(&self, batch: &Batch) -> ClassifyBatch<B> {
        self.batch(batch.samples.clone())
    }
}

impl<B: Backend> Batcher<ClassifySample, ClassifyBatch<B>> for ClassifyBatcher<B> {
    fn batch(&self, items: Vec<ClassifySample>) -> ClassifyBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.iter().map(|s| s.token_ids.len()).max().unwrap_or(0);

        let mut input_flat: Vec<i32> = Vec::with_capacity(batch_size * seq_len);
        for sample in &items {
            input_flat.extend(sample.token_ids.iter().map(|&id| id as i32));
            input_flat.extend(std::iter::repeat(self.pad_id as i32).take(seq_len - sample.token_ids.len()));
        }

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ClassifyBatch { input_ids, labels }
    }
}

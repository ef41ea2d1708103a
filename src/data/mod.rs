// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between token-id files on disk and tensor batches.
//
//   train.tsv / test.tsv
//       │
//       ▼
//   TsvCorpus         → parses `label<TAB>id id id` lines
//       │
//       ▼
//   ClassifyDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   Batch             → fixed-size groups of samples (domain type)
//       │
//       ▼
//   ClassifyBatcher   → pads rows and stacks them into tensors
//
// Tokenisation and vocabulary construction happen upstream;
// this layer only ever sees integer ids.

/// Implements Burn's Dataset trait for classification samples
pub mod dataset;

/// Reads `label<TAB>ids` files and serves batches per mode
pub mod loader;

/// Implements Burn's Batcher trait to create padded tensor batches
pub mod batcher;

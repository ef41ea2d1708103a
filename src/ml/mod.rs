// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All the tensor code lives here.
//
//   init.rs       — truncated-normal initialiser
//   encoder.rs    — masked LSTM cell, bidirectional encoder,
//                   last-valid-step selection
//   model.rs      — config, embedding, sequence lengths,
//                   classifier head, dropout keep-probability
//   objective.rs  — cross-entropy, accuracy, Adam step
//   context.rs    — the device + seed the controller owns
//   controller.rs — initialise / train / test / restore loop
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Hochreiter & Schmidhuber (1997) LSTM

pub mod init;

pub mod encoder;

/// Bidirectional LSTM classifier architecture
pub mod model;

pub mod objective;

pub mod context;

/// Epoch-driven training, evaluation and checkpointing
pub mod controller;

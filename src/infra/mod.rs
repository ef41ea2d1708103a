// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that touch the filesystem:
//
//   checkpoint.rs — Saving and loading model weights with Burn's
//                   named MessagePack recorder, plus the model
//                   configuration as JSON so a later `test` run
//                   can rebuild the same architecture.
//
//   metrics.rs    — Per-iteration progress output: the console
//                   line and an optional CSV log.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Console and CSV progress sinks
pub mod metrics;

// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Wires the data provider, the controller and the progress
// sinks together for one command.
//
// Rules for this layer:
//   - No tensor code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination

// Train (and by default evaluate) a fresh model
pub mod train_use_case;

// Evaluate a model restored from its checkpoint
pub mod test_use_case;

// Predict classes for unlabeled rows with a restored model
pub mod predict_use_case;

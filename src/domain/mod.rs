// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe the
// classification problem itself.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain data, validation and abstractions
//
// Everything the model consumes (batches of token ids and
// labels) and everything it emits (progress records) is
// defined here, so the data and infra layers can be tested
// without a tensor backend.

// Token-id samples, batches and the train/test mode selector
pub mod sample;

// Error taxonomy for contract violations and controller state
pub mod error;

// Per-iteration progress records
pub mod progress;

// Core abstractions (traits) that other layers implement
pub mod traits;

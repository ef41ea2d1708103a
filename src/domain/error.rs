// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure here is fatal for the current call. Nothing in
// the crate retries; the application layer wraps these into
// anyhow errors and terminates the command.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("batch is empty")]
    EmptyBatch,

    #[error("batch has {rows} rows but {labels} labels")]
    RowLabelMismatch { rows: usize, labels: usize },

    #[error("token id {id} at row {row}, position {position} is outside the vocabulary (size {vocab_size})")]
    TokenOutOfRange { row: usize, position: usize, id: u32, vocab_size: usize },

    #[error("row {row} contains no tokens besides padding")]
    EmptySequence { row: usize },

    #[error("label {label} at row {row} is not a class index (num_classes {num_classes})")]
    LabelOutOfRange { row: usize, label: usize, num_classes: usize },

    #[error("keep probability must be in (0, 1], got {0}")]
    InvalidKeepProb(f64),

    #[error("model parameters are not initialised; call initialize() or restore() first")]
    NotInitialized,

    #[error("checkpoint was trained with {field}={saved}, current configuration has {current}")]
    ConfigMismatch { field: &'static str, saved: usize, current: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClassifierError::TokenOutOfRange { row: 1, position: 3, id: 42, vocab_size: 10 };
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("vocabulary"));

        let err = ClassifierError::ConfigMismatch { field: "num_hidden", saved: 8, current: 4 };
        assert!(err.to_string().contains("num_hidden=8"));
    }
}

// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The controller never knows where batches come from or where
// progress goes. It talks to these two traits only:
//
//   BatchSource  — implemented by TsvCorpus (files on disk) and
//                  InMemorySource (tests)
//   ProgressSink — implemented by ConsoleSink (stdout + optional
//                  CSV) and Vec<ProgressRecord> (tests)

use anyhow::Result;

use crate::domain::progress::ProgressRecord;
use crate::domain::sample::{Batch, Mode};

/// Iterator over the batches of one pass.
pub type BatchIter<'a> = Box<dyn Iterator<Item = Result<Batch>> + 'a>;

// ─── BatchSource ──────────────────────────────────────────────────────────────
/// Anything that can serve a finite sequence of batches for a mode.
///
/// Every call starts a fresh pass, so the controller calls it once
/// per epoch. Shuffling, if any, is the source's business.
pub trait BatchSource {
    fn batches(&self, mode: Mode) -> Result<BatchIter<'_>>;
}

// ─── ProgressSink ─────────────────────────────────────────────────────────────
/// Receives one record per training or evaluation iteration.
pub trait ProgressSink {
    fn record(&mut self, record: &ProgressRecord) -> Result<()>;
}

impl ProgressSink for Vec<ProgressRecord> {
    fn record(&mut self, record: &ProgressRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

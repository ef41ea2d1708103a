// ============================================================
// Layer 3 — Progress Records
// ============================================================
// One record per training or evaluation iteration. The Display
// impl is the human-readable console line:
//
//   <Train>  Epoch: [1] Iter: [3] Step: [96] Loss: [0.693]  Acc: [0.500]
//   <Test>   Iter: [3] Loss: [0.512]  Acc: [0.750]
//
// Loss and accuracy are always shown with three decimals.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Train,
    Test,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Train => "train",
            Phase::Test  => "test",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub phase:     Phase,
    /// 1-based epoch; always 0 for the test pass
    pub epoch:     usize,
    /// Cumulative iteration count within the call
    pub iteration: usize,
    /// Cumulative number of examples seen within the call
    pub examples:  usize,
    pub loss:      f64,
    pub accuracy:  f64,
}

impl fmt::Display for ProgressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Phase::Train => write!(
                f,
                "<Train>\t Epoch: [{}] Iter: [{}] Step: [{}] Loss: [{:.3}]\t Acc: [{:.3}]",
                self.epoch, self.iteration, self.examples, self.loss, self.accuracy,
            ),
            Phase::Test => write!(
                f,
                "<Test>\t Iter: [{}] Loss: [{:.3}]\t Acc: [{:.3}]",
                self.iteration, self.loss, self.accuracy,
            ),
        }
    }
}

//! The verdict and report shape the CLI prints.

use lantern_pack::ChainStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coverage {
    Full,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub verdict: Verdict,
    pub first_bad_seq: Option<u64>,
    pub checked_events: u64,
    pub chain_status: ChainStatus,
    pub coverage: Coverage,
    pub anchor_note: String,
}

impl VerifyReport {
    pub fn is_pass(&self) -> bool {
        matches!(self.verdict, Verdict::Pass)
    }
}

//! Error taxonomy for the chain engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("chain violation at seq {seq}: {detail}")]
    ChainViolation { seq: u64, detail: String },

    #[error("canonicalization error: {0}")]
    Canon(#[from] lantern_canon::CanonError),

    #[error("payload parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("signature error: {0}")]
    Signature(#[from] lantern_checkpoint::SignatureError),

    #[error("anchor error: {0}")]
    Anchor(#[from] lantern_anchor::AnchorError),
}

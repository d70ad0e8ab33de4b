//! Errors the forensic pack exporter can surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("chain storage error: {0}")]
    Chain(#[from] lantern_chain::ChainError),

    #[error("pack assembly error: {0}")]
    Pack(#[from] lantern_pack::PackError),

    #[error("internal verification error: {0}")]
    Verify(#[from] lantern_verify::VerifyError),

    #[error(
        "refusing to export: internal self-check failed at seq {seq:?}: {reason}"
    )]
    SelfCheckFailed { seq: Option<u64>, reason: String },

    #[error("I/O error writing pack: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

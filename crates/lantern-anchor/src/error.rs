//! Error types for anchoring operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("anchor not found: {0}")]
    NotFound(String),

    #[error("anchor verification failed: {0}")]
    VerificationFailed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("canonicalization error: {0}")]
    Canon(#[from] lantern_canon::CanonError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("anchor-required mode is active but no non-log-only backend is configured")]
    AnchorRequiredNotSatisfied,

    #[error("unknown anchor backend type: {0}")]
    UnknownBackendType(String),
}

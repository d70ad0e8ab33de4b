//! Errors the offline verifier can surface. These abort verification
//! entirely (`PackIntegrityError`-style), as distinct from a `Fail` verdict,
//! which is a successful verification run that found tampering.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("pack integrity check failed: pack_hash does not match the pack's contents")]
    PackIntegrity,

    #[error("malformed pack: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error reading pack: {0}")]
    Io(#[from] std::io::Error),

    #[error("canonicalization error replaying chain: {0}")]
    Canon(#[from] lantern_canon::CanonError),

    #[error("pack error: {0}")]
    Pack(#[from] lantern_pack::PackError),
}

//! Errors for checkpoint construction, signing, and verification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("no key found for kid '{0}'")]
    KeyNotFound(String),

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("malformed signature encoding: {0}")]
    MalformedSignature(String),

    #[error("malformed PEM key: {0}")]
    MalformedKey(String),

    #[error("I/O error reading key material: {0}")]
    Io(#[from] std::io::Error),

    #[error("canonicalization error: {0}")]
    Canon(#[from] lantern_canon::CanonError),

    #[error("payload (de)serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

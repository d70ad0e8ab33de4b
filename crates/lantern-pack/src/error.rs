//! Pack (de)serialization and integrity errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("pack integrity check failed: pack_hash does not match recomputed hash")]
    PackIntegrity,

    #[error("malformed pack JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

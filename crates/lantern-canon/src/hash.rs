//! SHA-256 hashing of canonical bytes.

use sha2::{Digest, Sha256};

/// Lowercase 64-character hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

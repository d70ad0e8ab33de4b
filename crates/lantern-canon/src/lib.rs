//! # Lantern Canon
//!
//! Deterministic, byte-exact canonical serialization for the Lantern audit
//! ledger. This crate is the **only** place in the workspace allowed to
//! define hashing primitives (`canon`, `sha256_hex`) — every other crate
//! that needs a hash goes through here.
//!
//! ## Quick start
//!
//! ```
//! use lantern_canon::{canon, sha256_hex, RawValue};
//!
//! let value = RawValue::map([("a", RawValue::Int(1)), ("b", RawValue::Int(2))]);
//! let bytes = canon(&value).unwrap();
//! let digest = sha256_hex(&bytes);
//! assert_eq!(digest.len(), 64);
//! ```

mod audit_payload;
mod canon;
mod error;
mod hash;
mod value;

pub use audit_payload::{audit_payload_v1, hash_audit_payload, AuditPayloadFields};
pub use canon::canon;
pub use error::{CanonError, CanonErrorKind};
pub use hash::sha256_hex;
pub use value::{CanonValue, RawValue};

#[cfg(test)]
mod drift_check {
    //! §4.1: a CI-style guarantee that this crate is the sole definer of
    //! hashing primitives. We can't run `cargo` here, so the check is a
    //! source-tree scan for `Sha256::new()`/`sha2::` outside the crates that
    //! are allowed to touch already-canonicalized bytes directly.
    use std::path::Path;

    const ALLOWED_SHA256_CRATES: &[&str] =
        &["lantern-canon", "lantern-checkpoint", "lantern-anchor"];

    #[test]
    fn no_other_crate_defines_hashing_primitives() {
        let workspace_crates = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .expect("crates/ parent directory");
        let Ok(entries) = std::fs::read_dir(workspace_crates) else {
            // Not running inside the full workspace checkout (e.g. packaged
            // crate build) — nothing to scan.
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with("lantern-") || ALLOWED_SHA256_CRATES.contains(&name) {
                continue;
            }
            scan_dir_for_raw_sha256(&path.join("src"));
        }
    }

    fn scan_dir_for_raw_sha256(dir: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                scan_dir_for_raw_sha256(&path);
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("rs") {
                continue;
            }
            let Ok(contents) = std::fs::read_to_string(&path) else {
                continue;
            };
            assert!(
                !contents.contains("Sha256::new()"),
                "{} constructs a Sha256 hasher directly; route hashing through lantern-canon",
                path.display()
            );
        }
    }
}

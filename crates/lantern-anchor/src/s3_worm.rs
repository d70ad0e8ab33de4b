//! Object-store WORM (write-once-read-many) backend.
//!
//! This workspace carries no AWS SDK dependency and the spec's invariants
//! (I7, S6) only require the offline-recomputable half of the contract, so
//! this models the object-store call against a local append-only directory
//! tree keyed by `seq`/`id` instead of performing real network I/O. See
//! DESIGN.md for the full reasoning.

use async_trait::async_trait;
use chrono::Utc;
use lantern_canon::{canon, sha256_hex, RawValue};
use lantern_checkpoint::Checkpoint;
use std::path::PathBuf;

use crate::backend::{
    build_anchor_payload, AnchorBackend, AnchorPayload, AnchorProof, AnchorReceipt, VerifyOutcome,
};
use crate::error::AnchorError;

#[derive(Debug, Clone)]
pub struct S3WormConfig {
    pub bucket: String,
    pub prefix: String,
    pub retention_days: u32,
    pub retention_mode: String,
    pub cross_account_id: Option<String>,
    /// Local directory standing in for the object store (see module docs).
    pub base_dir: PathBuf,
}

#[derive(Debug)]
pub struct S3WormBackend {
    config: S3WormConfig,
}

impl S3WormBackend {
    pub fn new(config: S3WormConfig) -> Self {
        Self { config }
    }

    fn object_key(&self, checkpoint: &Checkpoint) -> String {
        format!(
            "{}/{}/{}.json",
            self.config.prefix, checkpoint.event_seq, checkpoint.id
        )
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.config.base_dir.join(&self.config.bucket).join(key)
    }
}

fn object_body(
    payload: &AnchorPayload,
    anchor_hash: &str,
    checkpoint: &Checkpoint,
) -> Result<String, AnchorError> {
    let value = RawValue::map([
        ("anchor_payload_v1", payload.to_raw_value()),
        ("anchor_hash", RawValue::str(anchor_hash)),
        ("checkpoint_signature", RawValue::str(&checkpoint.signature)),
        ("signature_alg", RawValue::str(&checkpoint.signature_alg)),
        ("signed_payload", RawValue::str(&checkpoint.signed_payload)),
    ]);
    let bytes = canon(&value)?;
    Ok(String::from_utf8(bytes).expect("canon() always emits valid UTF-8"))
}

#[async_trait]
impl AnchorBackend for S3WormBackend {
    fn name(&self) -> &str {
        "s3-worm"
    }

    async fn anchor(
        &self,
        checkpoint: &Checkpoint,
        engine_id: &str,
        audit_payload_version: u32,
    ) -> Result<AnchorReceipt, AnchorError> {
        let payload = build_anchor_payload(checkpoint, engine_id, audit_payload_version);
        let anchor_hash = payload.anchor_hash()?;
        let body = object_body(&payload, &anchor_hash, checkpoint)?;
        let object_hash = sha256_hex(body.as_bytes());

        let key = self.object_key(checkpoint);
        let path = self.object_path(&key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if path.exists() {
            return Err(AnchorError::WriteFailed(format!(
                "object {} already exists; WORM objects are never overwritten",
                key
            )));
        }
        std::fs::write(&path, &body)?;

        Ok(AnchorReceipt {
            anchor_type: "s3-worm".to_string(),
            anchor_id: format!("s3://{}/{}", self.config.bucket, key),
            anchored_at: Utc::now(),
            anchor_hash,
            anchor_payload: payload,
            checkpoint_id: checkpoint.id.clone(),
            checkpoint_seq: checkpoint.event_seq,
            proof: AnchorProof::Worm {
                object_body: body,
                object_hash,
                retention_mode: self.config.retention_mode.clone(),
                retention_days: self.config.retention_days,
                cross_account_id: self.config.cross_account_id.clone(),
            },
        })
    }

    async fn verify(&self, receipt: &AnchorReceipt) -> Result<VerifyOutcome, AnchorError> {
        let AnchorProof::Worm {
            object_body,
            object_hash,
            ..
        } = &receipt.proof
        else {
            return Ok(VerifyOutcome::fail("receipt has no WORM proof"));
        };

        if sha256_hex(object_body.as_bytes()) != *object_hash {
            return Ok(VerifyOutcome::fail("object_hash does not match object_body"));
        }

        let parsed: serde_json::Value = serde_json::from_str(object_body)
            .map_err(|e| AnchorError::ReadFailed(e.to_string()))?;
        let embedded_anchor_hash = parsed
            .get("anchor_hash")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if embedded_anchor_hash != receipt.anchor_hash {
            return Ok(VerifyOutcome::fail(
                "object_body's embedded anchor_hash does not match receipt",
            ));
        }
        Ok(VerifyOutcome::ok())
    }

    async fn is_healthy(&self) -> bool {
        self.config.base_dir.exists() || std::fs::create_dir_all(&self.config.base_dir).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use lantern_checkpoint::{CheckpointSigner, StaticSigningKeyProvider};
    use rand_core::OsRng;
    use std::sync::Arc;

    fn checkpoint() -> Checkpoint {
        let signing_key = SigningKey::generate(&mut OsRng);
        let provider = Arc::new(StaticSigningKeyProvider::new("k1", signing_key));
        CheckpointSigner::new(provider)
            .sign_checkpoint(5, "abc", 5, None)
            .unwrap()
    }

    fn backend(dir: &tempfile::TempDir) -> S3WormBackend {
        S3WormBackend::new(S3WormConfig {
            bucket: "lantern-audit".to_string(),
            prefix: "checkpoints".to_string(),
            retention_days: 365,
            retention_mode: "COMPLIANCE".to_string(),
            cross_account_id: None,
            base_dir: dir.path().to_path_buf(),
        })
    }

    #[tokio::test]
    async fn anchors_and_verifies_offline() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let cp = checkpoint();
        let receipt = backend.anchor(&cp, "lantern", 1).await.unwrap();
        let outcome = backend.verify(&receipt).await.unwrap();
        assert!(outcome.valid);
    }

    #[tokio::test]
    async fn tampered_object_body_detected_offline() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let cp = checkpoint();
        let mut receipt = backend.anchor(&cp, "lantern", 1).await.unwrap();
        if let AnchorProof::Worm { object_body, .. } = &mut receipt.proof {
            object_body.push_str("tampered");
        }
        let outcome = backend.verify(&receipt).await.unwrap();
        assert!(!outcome.valid);
    }
}

//! The no-trust-boundary backend: logs a structured line and nothing more.

use async_trait::async_trait;
use chrono::Utc;
use lantern_checkpoint::Checkpoint;

use crate::backend::{
    build_anchor_payload, AnchorBackend, AnchorProof, AnchorReceipt, VerifyOutcome,
};
use crate::error::AnchorError;

#[derive(Debug, Default)]
pub struct LogOnlyBackend;

impl LogOnlyBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnchorBackend for LogOnlyBackend {
    fn name(&self) -> &str {
        "log-only"
    }

    async fn anchor(
        &self,
        checkpoint: &Checkpoint,
        engine_id: &str,
        audit_payload_version: u32,
    ) -> Result<AnchorReceipt, AnchorError> {
        let payload = build_anchor_payload(checkpoint, engine_id, audit_payload_version);
        let anchor_hash = payload.anchor_hash()?;

        tracing::info!(
            target: "checkpoint.anchored",
            anchor_hash = %anchor_hash,
            checkpoint_id = %checkpoint.id,
            "checkpoint anchored (log-only, no external trust boundary)"
        );

        Ok(AnchorReceipt {
            anchor_type: "log-only".to_string(),
            anchor_id: format!("log://{}", payload.checkpoint_id),
            anchored_at: Utc::now(),
            anchor_hash,
            anchor_payload: payload,
            checkpoint_id: checkpoint.id.clone(),
            checkpoint_seq: checkpoint.event_seq,
            proof: AnchorProof::Log,
        })
    }

    async fn verify(&self, receipt: &AnchorReceipt) -> Result<VerifyOutcome, AnchorError> {
        use subtle::ConstantTimeEq;

        let recomputed = receipt.anchor_payload.anchor_hash()?;
        if recomputed.as_bytes().ct_eq(receipt.anchor_hash.as_bytes()).into() {
            Ok(VerifyOutcome::ok())
        } else {
            Ok(VerifyOutcome::fail("anchor_hash mismatch"))
        }
    }

    async fn is_healthy(&self) -> bool {
        true
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

    #[tokio::test]
    async fn anchors_and_verifies() {
        let backend = LogOnlyBackend::new();
        let cp = checkpoint();
        let receipt = backend.anchor(&cp, "lantern", 1).await.unwrap();
        assert_eq!(receipt.anchor_type, "log-only");
        let outcome = backend.verify(&receipt).await.unwrap();
        assert!(outcome.valid);
    }

    #[tokio::test]
    async fn tampered_hash_fails_verify() {
        let backend = LogOnlyBackend::new();
        let cp = checkpoint();
        let mut receipt = backend.anchor(&cp, "lantern", 1).await.unwrap();
        receipt.anchor_hash = "0".repeat(64);
        let outcome = backend.verify(&receipt).await.unwrap();
        assert!(!outcome.valid);
    }
}

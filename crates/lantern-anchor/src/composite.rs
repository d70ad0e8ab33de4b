//! Fans a single checkpoint out to N child backends.

use async_trait::async_trait;
use lantern_checkpoint::Checkpoint;

use crate::backend::{AnchorBackend, AnchorProof, AnchorReceipt, VerifyOutcome};
use crate::error::AnchorError;

pub struct CompositeBackend {
    children: Vec<Box<dyn AnchorBackend>>,
}

impl CompositeBackend {
    pub fn new(children: Vec<Box<dyn AnchorBackend>>) -> Self {
        Self { children }
    }
}

#[async_trait]
impl AnchorBackend for CompositeBackend {
    fn name(&self) -> &str {
        "composite"
    }

    async fn anchor(
        &self,
        checkpoint: &Checkpoint,
        engine_id: &str,
        audit_payload_version: u32,
    ) -> Result<AnchorReceipt, AnchorError> {
        if self.children.is_empty() {
            return Err(AnchorError::BackendUnavailable(
                "composite backend has no children configured".to_string(),
            ));
        }

        let mut receipts = Vec::with_capacity(self.children.len());
        for child in &self.children {
            receipts.push(child.anchor(checkpoint, engine_id, audit_payload_version).await?);
        }

        // Mirror the first child's identity for backward-compatible readers;
        // integrity is established per-child inside `proof.receipts`.
        let first = receipts[0].clone();
        Ok(AnchorReceipt {
            anchor_type: first.anchor_type,
            anchor_id: first.anchor_id,
            anchored_at: first.anchored_at,
            anchor_hash: first.anchor_hash,
            anchor_payload: first.anchor_payload,
            checkpoint_id: checkpoint.id.clone(),
            checkpoint_seq: checkpoint.event_seq,
            proof: AnchorProof::Multi { receipts },
        })
    }

    async fn verify(&self, receipt: &AnchorReceipt) -> Result<VerifyOutcome, AnchorError> {
        let AnchorProof::Multi { receipts } = &receipt.proof else {
            return Ok(VerifyOutcome::fail("receipt has no composite proof"));
        };
        for (child, child_receipt) in self.children.iter().zip(receipts) {
            let outcome = child.verify(child_receipt).await?;
            if !outcome.valid {
                return Ok(outcome);
            }
        }
        Ok(VerifyOutcome::ok())
    }

    async fn is_healthy(&self) -> bool {
        for child in &self.children {
            if !child.is_healthy().await {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_only::LogOnlyBackend;
    use crate::rfc3161::{Rfc3161Backend, Rfc3161Config};
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
    async fn fans_out_and_verifies_all_children() {
        let children: Vec<Box<dyn AnchorBackend>> = vec![
            Box::new(LogOnlyBackend::new()),
            Box::new(Rfc3161Backend::new(Rfc3161Config {
                tsa_url: "https://tsa.example.test".to_string(),
                trusted_fingerprints: vec![],
            })),
        ];
        let backend = CompositeBackend::new(children);
        let cp = checkpoint();
        let receipt = backend.anchor(&cp, "lantern", 1).await.unwrap();
        let outcome = backend.verify(&receipt).await.unwrap();
        assert!(outcome.valid);
    }
}

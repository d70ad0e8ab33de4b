//! RFC3161-style time-stamping backend.
//!
//! No live TSA is contacted — the workspace carries no HTTP client for it and
//! the spec's invariants only require the offline-checkable half of the
//! contract (`message_imprint`). The `token` field stays absent; a verifier
//! encountering it reports that full validation "requires live access".

use async_trait::async_trait;
use chrono::Utc;
use lantern_checkpoint::Checkpoint;
use rand::RngCore;

use crate::backend::{
    build_anchor_payload, AnchorBackend, AnchorProof, AnchorReceipt, VerifyOutcome,
};
use crate::error::AnchorError;

#[derive(Debug, Clone)]
pub struct Rfc3161Config {
    pub tsa_url: String,
    pub trusted_fingerprints: Vec<String>,
}

#[derive(Debug)]
pub struct Rfc3161Backend {
    config: Rfc3161Config,
}

impl Rfc3161Backend {
    pub fn new(config: Rfc3161Config) -> Self {
        Self { config }
    }
}

fn message_imprint(anchor_hash: &str) -> String {
    lantern_canon::sha256_hex(anchor_hash.as_bytes())
}

fn nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl AnchorBackend for Rfc3161Backend {
    fn name(&self) -> &str {
        "rfc3161"
    }

    async fn anchor(
        &self,
        checkpoint: &Checkpoint,
        engine_id: &str,
        audit_payload_version: u32,
    ) -> Result<AnchorReceipt, AnchorError> {
        let payload = build_anchor_payload(checkpoint, engine_id, audit_payload_version);
        let anchor_hash = payload.anchor_hash()?;
        let imprint = message_imprint(&anchor_hash);

        tracing::info!(
            target: "checkpoint.anchored",
            tsa_url = %self.config.tsa_url,
            message_imprint = %imprint,
            "recorded intent to time-stamp checkpoint (no live TSA contact)"
        );

        Ok(AnchorReceipt {
            anchor_type: "rfc3161".to_string(),
            anchor_id: format!("tsa://{}#{}", self.config.tsa_url, payload.checkpoint_id),
            anchored_at: Utc::now(),
            anchor_hash,
            anchor_payload: payload,
            checkpoint_id: checkpoint.id.clone(),
            checkpoint_seq: checkpoint.event_seq,
            proof: AnchorProof::Timestamp {
                message_imprint: imprint,
                nonce: nonce(),
                token: None,
                trusted_fingerprints: self.config.trusted_fingerprints.clone(),
            },
        })
    }

    async fn verify(&self, receipt: &AnchorReceipt) -> Result<VerifyOutcome, AnchorError> {
        let AnchorProof::Timestamp {
            message_imprint: imprint,
            token,
            ..
        } = &receipt.proof
        else {
            return Ok(VerifyOutcome::fail("receipt has no timestamp proof"));
        };

        if *imprint != message_imprint(&receipt.anchor_hash) {
            return Ok(VerifyOutcome::fail(
                "message_imprint does not match sha256(anchor_hash)",
            ));
        }
        if token.is_some() {
            return Ok(VerifyOutcome::fail(
                "timestamp token present; full verification requires live access",
            ));
        }
        Ok(VerifyOutcome::ok())
    }

    async fn is_healthy(&self) -> bool {
        !self.config.tsa_url.is_empty()
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

    fn backend() -> Rfc3161Backend {
        Rfc3161Backend::new(Rfc3161Config {
            tsa_url: "https://tsa.example.test".to_string(),
            trusted_fingerprints: vec!["deadbeef".to_string()],
        })
    }

    #[tokio::test]
    async fn message_imprint_recomputes_offline() {
        let b = backend();
        let cp = checkpoint();
        let receipt = b.anchor(&cp, "lantern", 1).await.unwrap();
        let outcome = b.verify(&receipt).await.unwrap();
        assert!(outcome.valid);
    }
}

//! Checkpoint payload construction, signing and verification (C3).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature as Ed25519Signature, Verifier};
use lantern_canon::{canon, RawValue};
use serde::{Deserialize, Serialize};

use crate::error::SignatureError;
use crate::keyring::{KeyRing, SigningKeyProvider};

/// A periodic signed commitment to the chain head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub event_seq: u64,
    pub event_hash: String,
    pub ts: DateTime<Utc>,
    pub prev_checkpoint_id: Option<String>,
    pub prev_checkpoint_hash: Option<String>,
    pub signature_alg: String,
    pub public_key_id: String,
    /// Base64-encoded raw signature bytes.
    pub signature: String,
    /// Canonical string representation of the payload that was actually
    /// signed.
    pub signed_payload: String,
    pub event_count: u64,
}

/// Build the canonical checkpoint payload value that gets signed.
pub fn build_checkpoint_payload(
    event_seq: u64,
    event_hash: &str,
    event_count: u64,
    ts: DateTime<Utc>,
    prev_checkpoint_id: Option<&str>,
    prev_checkpoint_hash: Option<&str>,
    kid: &str,
) -> RawValue {
    let opt = |s: Option<&str>| match s {
        Some(v) => RawValue::str(v),
        None => RawValue::Null,
    };
    RawValue::map([
        ("event_seq", RawValue::Int(event_seq as i64)),
        ("event_hash", RawValue::str(event_hash)),
        ("event_count", RawValue::Int(event_count as i64)),
        ("ts", RawValue::str(ts.to_rfc3339())),
        ("prev_checkpoint_id", opt(prev_checkpoint_id)),
        ("prev_checkpoint_hash", opt(prev_checkpoint_hash)),
        ("kid", RawValue::str(kid)),
    ])
}

/// Re-derive `prev_checkpoint_hash` from a checkpoint's `signed_payload`:
/// the first 64 characters of the canonical re-serialization of that
/// payload. This is a compact binding, not a hash — chain linkage is
/// independently guaranteed by signatures and by `prev_checkpoint_id`
/// (see the open question in the design notes).
pub fn derive_prev_checkpoint_hash(signed_payload: &str) -> Result<String, SignatureError> {
    let parsed: serde_json::Value = serde_json::from_str(signed_payload)?;
    let raw = RawValue::from_json(&parsed);
    let bytes = canon(&raw)?;
    let reserialized = String::from_utf8_lossy(&bytes).into_owned();
    Ok(reserialized.chars().take(64).collect())
}

/// Signs checkpoint payloads with a [`SigningKeyProvider`].
pub struct CheckpointSigner {
    provider: Arc<dyn SigningKeyProvider>,
}

impl CheckpointSigner {
    pub fn new(provider: Arc<dyn SigningKeyProvider>) -> Self {
        Self { provider }
    }

    pub fn kid(&self) -> &str {
        self.provider.kid()
    }

    /// Build and sign a checkpoint committing to `(event_seq, event_hash)`.
    pub fn sign_checkpoint(
        &self,
        event_seq: u64,
        event_hash: &str,
        event_count: u64,
        prev: Option<&Checkpoint>,
    ) -> Result<Checkpoint, SignatureError> {
        let ts = Utc::now();
        let kid = self.provider.kid();
        let prev_checkpoint_id = prev.map(|p| p.id.as_str());
        let prev_checkpoint_hash = prev
            .map(|p| derive_prev_checkpoint_hash(&p.signed_payload))
            .transpose()?;

        let payload = build_checkpoint_payload(
            event_seq,
            event_hash,
            event_count,
            ts,
            prev_checkpoint_id,
            prev_checkpoint_hash.as_deref(),
            kid,
        );
        let signed_payload_bytes = canon(&payload)?;
        let signature_bytes = self.provider.sign(&signed_payload_bytes);
        let signed_payload = String::from_utf8(signed_payload_bytes)
            .expect("canon() always emits valid UTF-8 JSON text");

        Ok(Checkpoint {
            id: uuid::Uuid::new_v4().to_string(),
            event_seq,
            event_hash: event_hash.to_string(),
            ts,
            prev_checkpoint_id: prev_checkpoint_id.map(str::to_string),
            prev_checkpoint_hash,
            signature_alg: "Ed25519".to_string(),
            public_key_id: kid.to_string(),
            signature: base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                signature_bytes,
            ),
            signed_payload,
            event_count,
        })
    }
}

/// Verify a checkpoint's signature against a key ring.
pub fn verify_checkpoint(
    checkpoint: &Checkpoint,
    key_ring: &KeyRing,
    strict_kid: bool,
) -> Result<(), SignatureError> {
    if checkpoint.signature_alg != "Ed25519" {
        return Err(SignatureError::UnsupportedAlgorithm(
            checkpoint.signature_alg.clone(),
        ));
    }
    let key = key_ring.resolve(&checkpoint.public_key_id, strict_kid)?;

    let sig_bytes = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        &checkpoint.signature,
    )
    .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| SignatureError::MalformedSignature("wrong signature length".into()))?;
    let signature = Ed25519Signature::from_bytes(&sig_array);

    key.verify_strict(checkpoint.signed_payload.as_bytes(), &signature)
        .map_err(|_| SignatureError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::StaticSigningKeyProvider;
    use ed25519_dalek::SigningKey;
    use rand_core::OsRng;

    fn provider(kid: &str) -> (Arc<StaticSigningKeyProvider>, ed25519_dalek::VerifyingKey) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying = signing_key.verifying_key();
        (
            Arc::new(StaticSigningKeyProvider::new(kid, signing_key)),
            verifying,
        )
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let (provider, verifying_key) = provider("default");
        let signer = CheckpointSigner::new(provider);
        let checkpoint = signer
            .sign_checkpoint(5, "deadbeef", 5, None)
            .expect("sign");

        let mut ring = KeyRing::new();
        ring.insert("default", verifying_key);
        verify_checkpoint(&checkpoint, &ring, true).expect("verify");
    }

    #[test]
    fn signing_is_deterministic_per_payload() {
        let (provider, _) = provider("default");
        let payload = build_checkpoint_payload(
            1,
            "abc",
            1,
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            None,
            None,
            "default",
        );
        let bytes = canon(&payload).unwrap();
        let sig1 = provider.sign(&bytes);
        let sig2 = provider.sign(&bytes);
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn chained_checkpoints_link_via_prev_hash() {
        let (provider, verifying_key) = provider("k1");
        let signer = CheckpointSigner::new(provider);
        let first = signer.sign_checkpoint(5, "h5", 5, None).unwrap();
        let second = signer
            .sign_checkpoint(10, "h10", 5, Some(&first))
            .unwrap();

        let expected = derive_prev_checkpoint_hash(&first.signed_payload).unwrap();
        assert_eq!(second.prev_checkpoint_hash.as_deref(), Some(expected.as_str()));
        assert_eq!(second.prev_checkpoint_id.as_deref(), Some(first.id.as_str()));

        let mut ring = KeyRing::new();
        ring.insert("k1", verifying_key);
        verify_checkpoint(&first, &ring, true).unwrap();
        verify_checkpoint(&second, &ring, true).unwrap();
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let (provider, verifying_key) = provider("default");
        let signer = CheckpointSigner::new(provider);
        let mut checkpoint = signer.sign_checkpoint(1, "h1", 1, None).unwrap();
        checkpoint.signed_payload.push_str("tampered");

        let mut ring = KeyRing::new();
        ring.insert("default", verifying_key);
        assert!(verify_checkpoint(&checkpoint, &ring, true).is_err());
    }
}

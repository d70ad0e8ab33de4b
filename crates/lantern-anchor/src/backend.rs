//! The `AnchorBackend` trait and the shared, content-addressed payload
//! construction every backend builds on top of.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lantern_canon::{canon, sha256_hex, RawValue};
use lantern_checkpoint::Checkpoint;
use serde::{Deserialize, Serialize};

use crate::error::AnchorError;

/// The versioned object every anchor backend content-addresses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnchorPayload {
    #[serde(rename = "_v")]
    pub v: u32,
    pub engine_id: String,
    pub audit_payload_version: u32,
    pub checkpoint_id: String,
    pub checkpoint_seq: u64,
    pub event_seq: u64,
    pub event_hash: String,
    pub checkpoint_hash: String,
    pub kid: String,
    pub created_at: DateTime<Utc>,
}

impl AnchorPayload {
    pub(crate) fn to_raw_value(&self) -> RawValue {
        RawValue::map([
            ("_v", RawValue::Int(self.v as i64)),
            ("engine_id", RawValue::str(&self.engine_id)),
            (
                "audit_payload_version",
                RawValue::Int(self.audit_payload_version as i64),
            ),
            ("checkpoint_id", RawValue::str(&self.checkpoint_id)),
            ("checkpoint_seq", RawValue::Int(self.checkpoint_seq as i64)),
            ("event_seq", RawValue::Int(self.event_seq as i64)),
            ("event_hash", RawValue::str(&self.event_hash)),
            ("checkpoint_hash", RawValue::str(&self.checkpoint_hash)),
            ("kid", RawValue::str(&self.kid)),
            ("created_at", RawValue::str(self.created_at.to_rfc3339())),
        ])
    }

    /// `anchor_hash = sha256_hex(canon(anchor_payload))` — every backend's
    /// content-addressing scheme (I7).
    pub fn anchor_hash(&self) -> Result<String, AnchorError> {
        let bytes = canon(&self.to_raw_value())?;
        Ok(sha256_hex(&bytes))
    }
}

/// `sha256_hex(checkpoint.signed_payload ++ checkpoint.signature)`.
pub fn checkpoint_hash(checkpoint: &Checkpoint) -> String {
    let mut bytes = checkpoint.signed_payload.clone().into_bytes();
    bytes.extend_from_slice(checkpoint.signature.as_bytes());
    sha256_hex(&bytes)
}

/// Build the shared `anchor_payload` every backend anchors.
pub fn build_anchor_payload(
    checkpoint: &Checkpoint,
    engine_id: &str,
    audit_payload_version: u32,
) -> AnchorPayload {
    AnchorPayload {
        v: 1,
        engine_id: engine_id.to_string(),
        audit_payload_version,
        checkpoint_id: checkpoint.id.clone(),
        checkpoint_seq: checkpoint.event_seq,
        event_seq: checkpoint.event_seq,
        event_hash: checkpoint.event_hash.clone(),
        checkpoint_hash: checkpoint_hash(checkpoint),
        kid: checkpoint.public_key_id.clone(),
        created_at: Utc::now(),
    }
}

/// Backend-specific evidence bundled into a receipt, recomputable offline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AnchorProof {
    Log,
    Worm {
        object_body: String,
        object_hash: String,
        retention_mode: String,
        retention_days: u32,
        cross_account_id: Option<String>,
    },
    Timestamp {
        message_imprint: String,
        nonce: String,
        token: Option<String>,
        trusted_fingerprints: Vec<String>,
    },
    Multi {
        receipts: Vec<AnchorReceipt>,
    },
}

/// Evidence that a checkpoint was published to an external trust boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnchorReceipt {
    pub anchor_type: String,
    pub anchor_id: String,
    pub anchored_at: DateTime<Utc>,
    pub anchor_hash: String,
    pub anchor_payload: AnchorPayload,
    pub checkpoint_id: String,
    pub checkpoint_seq: u64,
    pub proof: AnchorProof,
}

/// The result of recomputing a receipt's evidence offline.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    pub valid: bool,
    pub reason: Option<String>,
}

impl VerifyOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// A pluggable external trust boundary a signed checkpoint can be published
/// to. The core only ever depends on this trait, never a concrete backend.
#[async_trait]
pub trait AnchorBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn anchor(
        &self,
        checkpoint: &Checkpoint,
        engine_id: &str,
        audit_payload_version: u32,
    ) -> Result<AnchorReceipt, AnchorError>;

    /// Recompute and cross-check a receipt's embedded evidence. Must be
    /// feasible offline whenever the backend's contract allows it.
    async fn verify(&self, receipt: &AnchorReceipt) -> Result<VerifyOutcome, AnchorError>;

    async fn is_healthy(&self) -> bool;
}

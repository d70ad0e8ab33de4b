//! The forensic pack artifact itself (§4.5/§4.6): a self-contained,
//! self-hashed JSON object replayable with no DB or network access.

use chrono::{DateTime, Utc};
use lantern_anchor::AnchorReceipt;
use lantern_checkpoint::Checkpoint;
use serde::{Deserialize, Serialize};

use crate::error::PackError;
use crate::event::PackEvent;

pub const PACK_FORMAT: &str = "lantern-forensic-pack/1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainStatus {
    Genesis,
    Linked,
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    pub from_seq: u64,
    pub to_seq: u64,
    pub event_count: u64,
    pub total_events_in_db: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeadSnapshot {
    pub seq: u64,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verification {
    pub algorithm: String,
    pub canonicalization_tag: String,
    pub payload_version: i64,
    pub chain_status: ChainStatus,
    pub checked_events: u64,
    pub first_bad_seq: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub engine_id: String,
    pub exported_at: DateTime<Utc>,
    pub exporter_version: String,
}

/// Every field that feeds `pack_hash`, excluding `pack_hash` itself. Kept as
/// a separate type (rather than an `Option<String>` field on the final
/// struct) so the hash input can never accidentally include the hash output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct PackBody {
    format: String,
    segment: Segment,
    head_at_export_time: HeadSnapshot,
    verification: Verification,
    manifest: Manifest,
    events: Vec<PackEvent>,
    checkpoints: Vec<Checkpoint>,
    anchor_receipts: Vec<AnchorReceipt>,
}

/// The exported forensic pack. `pack_hash` is deliberately **not** computed
/// with the canonicalizer: it is `sha256_hex` of the ordinary
/// `serde_json::to_string` rendering of every other field, a fast
/// file-level tripwire distinct from the chain's own hash chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForensicPack {
    pub format: String,
    pub segment: Segment,
    pub head_at_export_time: HeadSnapshot,
    pub verification: Verification,
    pub manifest: Manifest,
    pub events: Vec<PackEvent>,
    pub checkpoints: Vec<Checkpoint>,
    pub anchor_receipts: Vec<AnchorReceipt>,
    pub pack_hash: String,
}

impl ForensicPack {
    /// Assemble a pack and compute its `pack_hash` over everything else.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        segment: Segment,
        head_at_export_time: HeadSnapshot,
        verification: Verification,
        manifest: Manifest,
        events: Vec<PackEvent>,
        checkpoints: Vec<Checkpoint>,
        anchor_receipts: Vec<AnchorReceipt>,
    ) -> Result<Self, PackError> {
        let body = PackBody {
            format: PACK_FORMAT.to_string(),
            segment,
            head_at_export_time,
            verification,
            manifest,
            events,
            checkpoints,
            anchor_receipts,
        };
        let pack_hash = hash_body(&body)?;

        Ok(Self {
            format: body.format,
            segment: body.segment,
            head_at_export_time: body.head_at_export_time,
            verification: body.verification,
            manifest: body.manifest,
            events: body.events,
            checkpoints: body.checkpoints,
            anchor_receipts: body.anchor_receipts,
            pack_hash,
        })
    }

    /// Recompute `pack_hash` over this pack's current fields (excluding the
    /// stored `pack_hash`) and compare it to what is stored.
    pub fn verify_pack_hash(&self) -> Result<bool, PackError> {
        let body = PackBody {
            format: self.format.clone(),
            segment: self.segment.clone(),
            head_at_export_time: self.head_at_export_time.clone(),
            verification: self.verification.clone(),
            manifest: self.manifest.clone(),
            events: self.events.clone(),
            checkpoints: self.checkpoints.clone(),
            anchor_receipts: self.anchor_receipts.clone(),
        };
        Ok(hash_body(&body)? == self.pack_hash)
    }
}

fn hash_body(body: &PackBody) -> Result<String, PackError> {
    let json = serde_json::to_string(body)?;
    Ok(lantern_canon::sha256_hex(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ForensicPack {
        ForensicPack::build(
            Segment {
                from_seq: 1,
                to_seq: 1,
                event_count: 1,
                total_events_in_db: 1,
            },
            HeadSnapshot {
                seq: 1,
                hash: "deadbeef".to_string(),
            },
            Verification {
                algorithm: "SHA-256".to_string(),
                canonicalization_tag: "lantern-canon/1".to_string(),
                payload_version: 1,
                chain_status: ChainStatus::Genesis,
                checked_events: 1,
                first_bad_seq: None,
            },
            Manifest {
                engine_id: "lantern".to_string(),
                exported_at: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
                exporter_version: "1.0.0".to_string(),
            },
            vec![],
            vec![],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn pack_hash_round_trips() {
        let pack = sample();
        assert!(pack.verify_pack_hash().unwrap());
    }

    #[test]
    fn tampering_a_field_breaks_pack_hash() {
        let mut pack = sample();
        pack.manifest.engine_id = "tampered".to_string();
        assert!(!pack.verify_pack_hash().unwrap());
    }
}

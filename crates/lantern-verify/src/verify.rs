//! Top-level offline verification algorithm (§4.6): pack integrity, chain
//! replay, checkpoint linkage and signatures, anchor receipts.

use lantern_checkpoint::KeyRing;
use lantern_pack::ForensicPack;

use crate::anchors::{anchor_note, verify_anchor_receipts};
use crate::checkpoints::verify_checkpoints;
use crate::error::VerifyError;
use crate::replay::replay_events;
use crate::report::{Coverage, Verdict, VerifyReport};

/// Verify a parsed forensic pack. Never performs network I/O; a provided
/// `key_ring` is the only way checkpoint signatures get checked.
pub fn verify_pack(
    pack: &ForensicPack,
    key_ring: Option<&KeyRing>,
    strict_kid: bool,
) -> Result<VerifyReport, VerifyError> {
    if !pack.verify_pack_hash()? {
        return Err(VerifyError::PackIntegrity);
    }

    let coverage = if pack.segment.event_count >= pack.segment.total_events_in_db {
        Coverage::Full
    } else {
        Coverage::Partial
    };
    let note = anchor_note(&pack.anchor_receipts);

    let replay = replay_events(&pack.events)?;
    if let Some(seq) = replay.first_bad_seq {
        return Ok(VerifyReport {
            verdict: Verdict::Fail {
                reason: replay
                    .failure_reason
                    .unwrap_or_else(|| "chain replay failed".to_string()),
            },
            first_bad_seq: Some(seq),
            checked_events: replay.checked_events,
            chain_status: replay.status,
            coverage,
            anchor_note: note,
        });
    }

    let checkpoint_issues =
        verify_checkpoints(&pack.checkpoints, &pack.events, key_ring, strict_kid);
    if let Some(issue) = checkpoint_issues.into_iter().next() {
        return Ok(VerifyReport {
            verdict: Verdict::Fail {
                reason: format!("checkpoint {}: {}", issue.checkpoint_id, issue.detail),
            },
            first_bad_seq: None,
            checked_events: replay.checked_events,
            chain_status: replay.status,
            coverage,
            anchor_note: note,
        });
    }

    let anchor_issues = verify_anchor_receipts(&pack.anchor_receipts, &pack.checkpoints);
    if let Some(issue) = anchor_issues.into_iter().next() {
        return Ok(VerifyReport {
            verdict: Verdict::Fail {
                reason: format!("anchor receipt for {}: {}", issue.checkpoint_id, issue.detail),
            },
            first_bad_seq: None,
            checked_events: replay.checked_events,
            chain_status: replay.status,
            coverage,
            anchor_note: note,
        });
    }

    Ok(VerifyReport {
        verdict: Verdict::Pass,
        first_bad_seq: None,
        checked_events: replay.checked_events,
        chain_status: replay.status,
        coverage,
        anchor_note: note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use lantern_pack::{HeadSnapshot, Manifest, PackEvent, Segment, Verification};

    fn genesis_pack() -> ForensicPack {
        let ts: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-01-01T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);
        let fields = lantern_canon::AuditPayloadFields {
            schema_version: "audit/1.1",
            seq: 1,
            ts: &ts.to_rfc3339(),
            action: "A",
            actor: "tester",
            receipt_id: None,
            export_id: None,
            saved_view_id: None,
            payload: r#"{"a":1}"#,
            ip: None,
            user_agent: None,
            prev_hash: "GENESIS",
        };
        let hash = lantern_canon::hash_audit_payload(&lantern_canon::audit_payload_v1(fields).unwrap())
            .unwrap();
        let event = PackEvent {
            seq: 1,
            ts,
            action: "A".to_string(),
            actor: "tester".to_string(),
            receipt_id: None,
            export_id: None,
            saved_view_id: None,
            payload: r#"{"a":1}"#.to_string(),
            ip: None,
            user_agent: None,
            prev_hash: "GENESIS".to_string(),
            hash: hash.clone(),
            schema_version: "audit/1.1".to_string(),
            payload_v: 1,
        };

        ForensicPack::build(
            Segment {
                from_seq: 1,
                to_seq: 1,
                event_count: 1,
                total_events_in_db: 1,
            },
            HeadSnapshot { seq: 1, hash },
            Verification {
                algorithm: "SHA-256".to_string(),
                canonicalization_tag: "lantern-canon/1".to_string(),
                payload_version: 1,
                chain_status: lantern_pack::ChainStatus::Genesis,
                checked_events: 1,
                first_bad_seq: None,
            },
            Manifest {
                engine_id: "lantern".to_string(),
                exported_at: ts,
                exporter_version: "1.0.0".to_string(),
            },
            vec![event],
            vec![],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn round_trip_passes() {
        let pack = genesis_pack();
        let report = verify_pack(&pack, None, true).unwrap();
        assert!(report.is_pass());
        assert_eq!(report.first_bad_seq, None);
    }

    #[test]
    fn pack_hash_tamper_is_rejected_before_replay() {
        let mut pack = genesis_pack();
        pack.events[0].payload = r#"{"a":999}"#.to_string();
        let err = verify_pack(&pack, None, true).unwrap_err();
        assert!(matches!(err, VerifyError::PackIntegrity));
    }

    #[test]
    fn tamper_with_recomputed_pack_hash_fails_at_seq() {
        let mut pack = genesis_pack();
        pack.events[0].payload = r#"{"a":999}"#.to_string();
        pack.pack_hash = "placeholder".to_string();
        let recomputed = ForensicPack::build(
            pack.segment.clone(),
            pack.head_at_export_time.clone(),
            pack.verification.clone(),
            pack.manifest.clone(),
            pack.events.clone(),
            pack.checkpoints.clone(),
            pack.anchor_receipts.clone(),
        )
        .unwrap();
        let report = verify_pack(&recomputed, None, true).unwrap();
        assert_eq!(report.first_bad_seq, Some(1));
    }
}

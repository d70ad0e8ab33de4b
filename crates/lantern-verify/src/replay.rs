//! Pure hash-chain replay (§4.6 step 3), shared by the verifier and (via
//! this crate) the exporter's own internal self-check.

use lantern_canon::{audit_payload_v1, hash_audit_payload, AuditPayloadFields};
use lantern_pack::{ChainStatus, PackEvent};

use crate::error::VerifyError;

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayResult {
    pub status: ChainStatus,
    pub checked_events: u64,
    pub first_bad_seq: Option<u64>,
    pub failure_reason: Option<String>,
}

impl ReplayResult {
    pub fn ok(&self) -> bool {
        self.first_bad_seq.is_none()
    }
}

fn bad(checked: u64, seq: u64, reason: impl Into<String>) -> ReplayResult {
    ReplayResult {
        status: ChainStatus::Linked,
        checked_events: checked,
        first_bad_seq: Some(seq),
        failure_reason: Some(reason.into()),
    }
}

/// Walk `events` in order, recomputing every hash and checking seq/prev_hash
/// linkage. Returns the first failing seq (if any) rather than erroring —
/// failure here is a verdict, not an exceptional condition.
pub fn replay_events(events: &[PackEvent]) -> Result<ReplayResult, VerifyError> {
    if events.is_empty() {
        return Ok(ReplayResult {
            status: ChainStatus::Empty,
            checked_events: 0,
            first_bad_seq: None,
            failure_reason: None,
        });
    }

    let first = &events[0];
    let mut expected_prev_hash = if first.seq == 1 {
        "GENESIS".to_string()
    } else {
        first.prev_hash.clone()
    };
    let mut expected_seq = first.seq;
    let mut checked = 0u64;

    for event in events {
        if event.seq != expected_seq {
            return Ok(bad(checked, event.seq, "seq gap"));
        }
        if event.prev_hash != expected_prev_hash {
            return Ok(bad(checked, event.seq, "prev_hash mismatch"));
        }
        if event.payload_v != 1 {
            return Ok(bad(checked, event.seq, "unsupported payload_v"));
        }

        let payload = audit_payload_v1(AuditPayloadFields {
            schema_version: &event.schema_version,
            seq: event.seq,
            ts: &event.ts.to_rfc3339(),
            action: &event.action,
            actor: &event.actor,
            receipt_id: event.receipt_id.as_deref(),
            export_id: event.export_id.as_deref(),
            saved_view_id: event.saved_view_id.as_deref(),
            payload: &event.payload,
            ip: event.ip.as_deref(),
            user_agent: event.user_agent.as_deref(),
            prev_hash: &event.prev_hash,
        })?;
        let hash = hash_audit_payload(&payload)?;

        if hash != event.hash {
            return Ok(bad(checked, event.seq, "hash mismatch"));
        }

        expected_prev_hash = hash;
        expected_seq += 1;
        checked += 1;
    }

    let status = if first.seq == 1 {
        ChainStatus::Genesis
    } else {
        ChainStatus::Linked
    };
    Ok(ReplayResult {
        status,
        checked_events: checked,
        first_bad_seq: None,
        failure_reason: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn event(seq: u64, prev_hash: &str, payload: &str) -> PackEvent {
        let ts: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-01-01T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);
        let fields = AuditPayloadFields {
            schema_version: "audit/1.1",
            seq,
            ts: &ts.to_rfc3339(),
            action: "A",
            actor: "tester",
            receipt_id: None,
            export_id: None,
            saved_view_id: None,
            payload,
            ip: None,
            user_agent: None,
            prev_hash,
        };
        let hash = hash_audit_payload(&audit_payload_v1(fields).unwrap()).unwrap();
        PackEvent {
            seq,
            ts,
            action: "A".to_string(),
            actor: "tester".to_string(),
            receipt_id: None,
            export_id: None,
            saved_view_id: None,
            payload: payload.to_string(),
            ip: None,
            user_agent: None,
            prev_hash: prev_hash.to_string(),
            hash,
            schema_version: "audit/1.1".to_string(),
            payload_v: 1,
        }
    }

    #[test]
    fn genesis_chain_replays_clean() {
        let e1 = event(1, "GENESIS", r#"{"a":1}"#);
        let e2 = event(2, &e1.hash, r#"{"a":2}"#);
        let result = replay_events(&[e1, e2]).unwrap();
        assert_eq!(result.status, ChainStatus::Genesis);
        assert!(result.ok());
        assert_eq!(result.checked_events, 2);
    }

    #[test]
    fn tampered_payload_fails_at_its_seq() {
        let e1 = event(1, "GENESIS", r#"{"a":1}"#);
        let mut e2 = event(2, &e1.hash, r#"{"a":2}"#);
        e2.payload = r#"{"a":999}"#.to_string();
        let result = replay_events(&[e1, e2]).unwrap();
        assert_eq!(result.first_bad_seq, Some(2));
        assert_eq!(result.failure_reason.as_deref(), Some("hash mismatch"));
    }

    #[test]
    fn empty_segment_is_empty_status() {
        let result = replay_events(&[]).unwrap();
        assert_eq!(result.status, ChainStatus::Empty);
    }
}

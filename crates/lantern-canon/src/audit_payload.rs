//! Construction of the canonical audit payload (v1) — the object that is
//! actually hashed for every event. Field names here follow the wire shape
//! from the spec (`schemaVersion`, `receiptId`, ...); this is the one place
//! in the workspace allowed to use that spelling (see the wire-vs-internal
//! design note).

use crate::canon::canon;
use crate::error::CanonError;
use crate::hash::sha256_hex;
use crate::value::RawValue;

/// Inputs needed to build a payload-v1 hashing object for one event.
pub struct AuditPayloadFields<'a> {
    pub schema_version: &'a str,
    pub seq: u64,
    pub ts: &'a str,
    pub action: &'a str,
    pub actor: &'a str,
    pub receipt_id: Option<&'a str>,
    pub export_id: Option<&'a str>,
    pub saved_view_id: Option<&'a str>,
    /// The caller's payload, as a serialized JSON blob. It is parsed into a
    /// value tree before being embedded, so hashing is insensitive to the
    /// caller's own key ordering inside `payload`.
    pub payload: &'a str,
    pub ip: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub prev_hash: &'a str,
}

fn opt_str(s: Option<&str>) -> RawValue {
    match s {
        Some(v) => RawValue::Str(v.to_string()),
        None => RawValue::Null,
    }
}

/// Build the canonical hashing object for a single event:
/// `{_v, schemaVersion, seq, ts, action, actor, receiptId, exportId,
/// savedViewId, payload, ip, userAgent, prevHash}`.
pub fn audit_payload_v1(fields: AuditPayloadFields) -> Result<RawValue, serde_json::Error> {
    let parsed_payload: serde_json::Value = serde_json::from_str(fields.payload)?;
    let payload_value = RawValue::from_json(&parsed_payload);

    Ok(RawValue::map([
        ("_v", RawValue::Int(1)),
        ("schemaVersion", RawValue::str(fields.schema_version)),
        ("seq", RawValue::Int(fields.seq as i64)),
        ("ts", RawValue::str(fields.ts)),
        ("action", RawValue::str(fields.action)),
        ("actor", RawValue::str(fields.actor)),
        ("receiptId", opt_str(fields.receipt_id)),
        ("exportId", opt_str(fields.export_id)),
        ("savedViewId", opt_str(fields.saved_view_id)),
        ("payload", payload_value),
        ("ip", opt_str(fields.ip)),
        ("userAgent", opt_str(fields.user_agent)),
        ("prevHash", RawValue::str(fields.prev_hash)),
    ]))
}

/// `sha256_hex(canon(payload_v1))`.
pub fn hash_audit_payload(payload_v1: &RawValue) -> Result<String, CanonError> {
    let bytes = canon(payload_v1)?;
    Ok(sha256_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_hashing_insensitive_to_caller_key_order() {
        let base = AuditPayloadFields {
            schema_version: "audit/1.1",
            seq: 1,
            ts: "2026-01-01T00:00:01Z",
            action: "A",
            actor: "tester",
            receipt_id: None,
            export_id: None,
            saved_view_id: None,
            payload: r#"{"a":1,"b":2}"#,
            ip: None,
            user_agent: None,
            prev_hash: "GENESIS",
        };
        let reordered = AuditPayloadFields {
            payload: r#"{"b":2,"a":1}"#,
            ..base_copy(&base)
        };
        let h1 = hash_audit_payload(&audit_payload_v1(base).unwrap()).unwrap();
        let h2 = hash_audit_payload(&audit_payload_v1(reordered).unwrap()).unwrap();
        assert_eq!(h1, h2);
    }

    fn base_copy<'a>(f: &AuditPayloadFields<'a>) -> AuditPayloadFields<'a> {
        AuditPayloadFields {
            schema_version: f.schema_version,
            seq: f.seq,
            ts: f.ts,
            action: f.action,
            actor: f.actor,
            receipt_id: f.receipt_id,
            export_id: f.export_id,
            saved_view_id: f.saved_view_id,
            payload: f.payload,
            ip: f.ip,
            user_agent: f.user_agent,
            prev_hash: f.prev_hash,
        }
    }
}

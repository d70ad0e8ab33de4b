//! The event shape embedded in a forensic pack.
//!
//! Deliberately independent of `lantern-chain::Event`: the pack schema must
//! stay depended-on by the offline verifier, which never links against the
//! chain engine's storage stack.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackEvent {
    pub seq: u64,
    pub ts: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub receipt_id: Option<String>,
    pub export_id: Option<String>,
    pub saved_view_id: Option<String>,
    pub payload: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub prev_hash: String,
    pub hash: String,
    pub schema_version: String,
    pub payload_v: i64,
}

//! The `Event` entity and the caller-supplied fields used to append one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: &str = "audit/1.1";
pub const PAYLOAD_VERSION: i64 = 1;

/// One audit entry, append-only once committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
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

/// Fields a caller supplies to append one event; `seq` and `prev_hash` are
/// derived by the chain engine under the head lock.
#[derive(Debug, Clone)]
pub struct AppendFields {
    pub action: String,
    pub actor: String,
    pub receipt_id: Option<String>,
    pub export_id: Option<String>,
    pub saved_view_id: Option<String>,
    /// A serialized JSON blob; parsed during hashing so hashing is
    /// insensitive to key order inside it.
    pub payload: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

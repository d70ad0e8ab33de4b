//! # Lantern Chain
//!
//! The transactional audit chain engine (C2): append-only events, the
//! singleton head pointer, and inline checkpoint invocation, backed by
//! SQLite via `sqlx`.

mod chain;
mod error;
mod event;

pub use chain::{AppendOutcome, AuditChain, ChainConfig};
pub use error::ChainError;
pub use event::{AppendFields, Event, PAYLOAD_VERSION, SCHEMA_VERSION};

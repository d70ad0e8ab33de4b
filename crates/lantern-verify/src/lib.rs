//! Offline forensic verifier for the Lantern audit ledger.
//!
//! This crate never touches a database or the network: it consumes a
//! [`lantern_pack::ForensicPack`] value already parsed from disk and recomputes
//! every hash, linkage, and signature it can recompute without live access.
//! It carries no `tokio`, `sqlx`, or `reqwest` dependency, even transitively,
//! and none should ever be added.

mod anchors;
mod checkpoints;
mod error;
mod replay;
mod report;
mod verify;

pub use anchors::{anchor_note, verify_anchor_receipts, AnchorIssue};
pub use checkpoints::{verify_checkpoints, CheckpointIssue};
pub use error::VerifyError;
pub use replay::{replay_events, ReplayResult};
pub use report::{Coverage, Verdict, VerifyReport};
pub use verify::verify_pack;

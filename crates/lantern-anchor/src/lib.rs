//! # Lantern Anchor
//!
//! The external anchor subsystem (C4): publishes signed checkpoints to one or
//! more external trust boundaries and returns a content-addressed anchor
//! receipt bound to the checkpoint by hash.
//!
//! Backends: [`log_only`] (no external trust boundary), [`s3_worm`]
//! (object-store WORM), [`rfc3161`] (time-stamping authority), and
//! [`composite`] (fan-out to several of the above).

mod backend;
mod composite;
mod config;
mod error;
mod log_only;
mod rfc3161;
mod s3_worm;

pub use backend::{
    build_anchor_payload, checkpoint_hash, AnchorBackend, AnchorPayload, AnchorProof,
    AnchorReceipt, VerifyOutcome,
};
pub use composite::CompositeBackend;
pub use config::{AnchorBackendType, AnchorConfig, AnchorsMode, S3Settings, TsaSettings};
pub use error::AnchorError;
pub use log_only::LogOnlyBackend;
pub use rfc3161::{Rfc3161Backend, Rfc3161Config};
pub use s3_worm::{S3WormBackend, S3WormConfig};

//! # Lantern Checkpoint
//!
//! Signed checkpoints: periodic commitments to the audit chain's head,
//! linked to the previous checkpoint and signed with Ed25519 (C3).

mod checkpoint;
mod error;
mod keyring;

pub use checkpoint::{
    build_checkpoint_payload, derive_prev_checkpoint_hash, verify_checkpoint, Checkpoint,
    CheckpointSigner,
};
pub use error::SignatureError;
pub use keyring::{KeyRing, SigningKeyProvider, StaticSigningKeyProvider};

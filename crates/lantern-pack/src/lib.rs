//! # Lantern Pack
//!
//! The forensic pack schema: a self-contained, self-hashed JSON artifact
//! covering a contiguous event segment plus the checkpoints and anchor
//! receipts that cover it. Shared by the exporter and the offline verifier
//! so the two can never drift in what a pack looks like.

mod error;
mod event;
mod pack;

pub use error::PackError;
pub use event::PackEvent;
pub use pack::{
    ChainStatus, ForensicPack, HeadSnapshot, Manifest, Segment, Verification, PACK_FORMAT,
};

//! Checkpoint cross-checks (§4.6 step 4): event binding, linkage, signature.

use lantern_checkpoint::{derive_prev_checkpoint_hash, verify_checkpoint, Checkpoint, KeyRing};
use lantern_pack::PackEvent;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointIssue {
    pub checkpoint_id: String,
    pub detail: String,
}

/// The subset of a checkpoint's `signed_payload` this crate cares about:
/// the event binding the signature actually covers. The outer `Checkpoint`
/// struct's `event_seq`/`event_hash` fields ride alongside the signature,
/// not under it, so they must be cross-checked against this.
#[derive(Deserialize)]
struct SignedEventBinding {
    event_seq: u64,
    event_hash: String,
}

/// Verify every checkpoint in `checkpoints` against `events` (when the
/// committed event is present in the pack) and against the checkpoint
/// immediately before it in this same list — the only linkage an offline
/// pack can check, since an out-of-range predecessor is simply absent.
pub fn verify_checkpoints(
    checkpoints: &[Checkpoint],
    events: &[PackEvent],
    key_ring: Option<&KeyRing>,
    strict_kid: bool,
) -> Vec<CheckpointIssue> {
    let mut issues = Vec::new();

    for (i, checkpoint) in checkpoints.iter().enumerate() {
        match serde_json::from_str::<SignedEventBinding>(&checkpoint.signed_payload) {
            Ok(binding) => {
                if binding.event_seq != checkpoint.event_seq || binding.event_hash != checkpoint.event_hash
                {
                    issues.push(CheckpointIssue {
                        checkpoint_id: checkpoint.id.clone(),
                        detail: format!(
                            "signed_payload binds (seq {}, hash {}) but the checkpoint's own \
                             event_seq/event_hash fields are (seq {}, hash {}) — signature does \
                             not cover the outer fields",
                            binding.event_seq,
                            binding.event_hash,
                            checkpoint.event_seq,
                            checkpoint.event_hash
                        ),
                    });
                }
            }
            Err(err) => issues.push(CheckpointIssue {
                checkpoint_id: checkpoint.id.clone(),
                detail: format!("could not parse signed_payload to cross-check binding: {err}"),
            }),
        }

        if let Some(event) = events.iter().find(|e| e.seq == checkpoint.event_seq) {
            if event.hash != checkpoint.event_hash {
                issues.push(CheckpointIssue {
                    checkpoint_id: checkpoint.id.clone(),
                    detail: format!(
                        "event_hash does not match event at seq {}",
                        checkpoint.event_seq
                    ),
                });
            }
        }

        if let Some(prev) = checkpoints[..i]
            .iter()
            .rev()
            .find(|c| Some(c.id.clone()) == checkpoint.prev_checkpoint_id)
        {
            match derive_prev_checkpoint_hash(&prev.signed_payload) {
                Ok(expected) => {
                    if checkpoint.prev_checkpoint_hash.as_deref() != Some(expected.as_str()) {
                        issues.push(CheckpointIssue {
                            checkpoint_id: checkpoint.id.clone(),
                            detail: "prev_checkpoint_hash does not match previous checkpoint"
                                .to_string(),
                        });
                    }
                }
                Err(err) => issues.push(CheckpointIssue {
                    checkpoint_id: checkpoint.id.clone(),
                    detail: format!("could not re-derive prev_checkpoint_hash: {err}"),
                }),
            }
        }

        if let Some(key_ring) = key_ring {
            if checkpoint.signature_alg == "Ed25519" {
                if let Err(err) = verify_checkpoint(checkpoint, key_ring, strict_kid) {
                    issues.push(CheckpointIssue {
                        checkpoint_id: checkpoint.id.clone(),
                        detail: format!("signature verification failed: {err}"),
                    });
                }
            }
        }
    }

    issues
}

//! Forensic pack exporter (C5) for the Lantern audit ledger.
//!
//! Reads a range of the chain via [`lantern_chain::AuditChain`], replays it
//! through the same pure verification logic the offline verifier uses (so
//! the two can never drift in what counts as a valid chain), and writes a
//! self-hashed [`lantern_pack::ForensicPack`] to disk atomically.

mod error;

pub use error::ExportError;

use std::path::Path;

use chrono::Utc;
use lantern_chain::AuditChain;
use lantern_pack::{ForensicPack, HeadSnapshot, Manifest, PackEvent, Segment, Verification};
use lantern_verify::replay_events;

pub const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One requested export range. `None` bounds mean "from genesis" / "to head".
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportRange {
    pub from_seq: Option<u64>,
    pub to_seq: Option<u64>,
}

fn to_pack_event(event: lantern_chain::Event) -> PackEvent {
    PackEvent {
        seq: event.seq,
        ts: event.ts,
        action: event.action,
        actor: event.actor,
        receipt_id: event.receipt_id,
        export_id: event.export_id,
        saved_view_id: event.saved_view_id,
        payload: event.payload,
        ip: event.ip,
        user_agent: event.user_agent,
        prev_hash: event.prev_hash,
        hash: event.hash,
        schema_version: event.schema_version,
        payload_v: event.payload_v,
    }
}

/// Read `range` off `chain`, self-check the replay, and assemble a
/// [`ForensicPack`]. Refuses to return a pack whose own replay fails —
/// an exporter that emits a pack it already knows is broken defeats the
/// point of a tamper-evident ledger.
pub async fn export(chain: &AuditChain, range: ExportRange) -> Result<ForensicPack, ExportError> {
    let (head_seq, head_hash) = chain.head().await?;
    let total_events_in_db = chain.total_event_count().await?;

    let from_seq = range.from_seq.unwrap_or(1);
    let to_seq = range.to_seq.unwrap_or(head_seq);

    let events: Vec<PackEvent> = chain
        .events_range(from_seq, to_seq)
        .await?
        .into_iter()
        .map(to_pack_event)
        .collect();

    let replay = replay_events(&events)?;
    if let Some(seq) = replay.first_bad_seq {
        tracing::error!(seq, reason = ?replay.failure_reason, "export self-check failed; refusing to write pack");
        return Err(ExportError::SelfCheckFailed {
            seq: Some(seq),
            reason: replay
                .failure_reason
                .unwrap_or_else(|| "chain replay failed".to_string()),
        });
    }

    let checkpoints = chain.checkpoints_range(from_seq, to_seq).await?;
    let checkpoint_ids: Vec<String> = checkpoints.iter().map(|c| c.id.clone()).collect();
    let anchor_receipts = chain.anchor_receipts_for_checkpoints(&checkpoint_ids).await?;

    let pack = ForensicPack::build(
        Segment {
            from_seq,
            to_seq,
            event_count: events.len() as u64,
            total_events_in_db,
        },
        HeadSnapshot {
            seq: head_seq,
            hash: head_hash,
        },
        Verification {
            algorithm: "SHA-256".to_string(),
            canonicalization_tag: "lantern-canon/1".to_string(),
            payload_version: lantern_chain::PAYLOAD_VERSION,
            chain_status: replay.status,
            checked_events: replay.checked_events,
            first_bad_seq: None,
        },
        Manifest {
            engine_id: chain.engine_id().to_string(),
            exported_at: Utc::now(),
            exporter_version: EXPORTER_VERSION.to_string(),
        },
        events,
        checkpoints,
        anchor_receipts,
    )?;

    tracing::info!(
        from_seq,
        to_seq,
        event_count = pack.segment.event_count,
        "exported forensic pack"
    );

    Ok(pack)
}

/// Export and write the pack to `path` atomically: serialize to
/// `<path>.tmp`, then `rename` into place so a crash mid-write never leaves
/// a partial pack visible at `path`.
pub async fn export_to_file(
    chain: &AuditChain,
    range: ExportRange,
    path: &Path,
) -> Result<ForensicPack, ExportError> {
    let pack = export(chain, range).await?;
    write_pack_atomically(&pack, path)?;
    Ok(pack)
}

fn write_pack_atomically(pack: &ForensicPack, path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_vec_pretty(pack)?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use lantern_chain::{AppendFields, ChainConfig};
    use lantern_checkpoint::{CheckpointSigner, StaticSigningKeyProvider};
    use rand_core::OsRng;
    use std::sync::Arc;

    fn fields(action: &str) -> AppendFields {
        AppendFields {
            action: action.to_string(),
            actor: "tester".to_string(),
            receipt_id: None,
            export_id: None,
            saved_view_id: None,
            payload: r#"{"a":1}"#.to_string(),
            ip: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn exports_a_self_consistent_pack() {
        let chain = AuditChain::open(ChainConfig::memory(), None).await.unwrap();
        chain.append_event(fields("A")).await.unwrap();
        chain.append_event(fields("B")).await.unwrap();

        let pack = export(&chain, ExportRange::default()).await.unwrap();
        assert_eq!(pack.events.len(), 2);
        assert!(pack.verify_pack_hash().unwrap());
        assert_eq!(pack.segment.total_events_in_db, 2);
    }

    #[tokio::test]
    async fn exports_with_checkpoints_and_anchor_receipts() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let provider = Arc::new(StaticSigningKeyProvider::new("k1", signing_key));
        let signer = CheckpointSigner::new(provider);

        let mut config = ChainConfig::memory();
        config.checkpoint_interval = Some(1);
        let chain = AuditChain::open(config, Some(signer)).await.unwrap();
        let outcome = chain.append_event(fields("A")).await.unwrap();
        let checkpoint = outcome.checkpoint.expect("checkpoint due at seq 1");

        let receipt = lantern_anchor::AnchorReceipt {
            anchor_type: "log-only".to_string(),
            anchor_id: format!("log://{}", checkpoint.id),
            anchored_at: Utc::now(),
            anchor_hash: lantern_anchor::build_anchor_payload(&checkpoint, "lantern", 1)
                .anchor_hash()
                .unwrap(),
            anchor_payload: lantern_anchor::build_anchor_payload(&checkpoint, "lantern", 1),
            checkpoint_id: checkpoint.id.clone(),
            checkpoint_seq: checkpoint.event_seq,
            proof: lantern_anchor::AnchorProof::Log,
        };
        chain.persist_anchor_receipt(&receipt).await.unwrap();

        let pack = export(&chain, ExportRange::default()).await.unwrap();
        assert_eq!(pack.checkpoints.len(), 1);
        assert_eq!(pack.anchor_receipts.len(), 1);
    }

    #[tokio::test]
    async fn writes_atomically_to_disk() {
        let chain = AuditChain::open(ChainConfig::memory(), None).await.unwrap();
        chain.append_event(fields("A")).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("export.json");
        export_to_file(&chain, ExportRange::default(), &out_path)
            .await
            .unwrap();

        assert!(out_path.exists());
        assert!(!out_path.with_extension("tmp").exists());
        let bytes = std::fs::read(&out_path).unwrap();
        let parsed: ForensicPack = serde_json::from_slice(&bytes).unwrap();
        assert!(parsed.verify_pack_hash().unwrap());
    }
}

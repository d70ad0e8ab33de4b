//! `lantern proof-run` - generate events, export, verify, tamper-test, and
//! write a signed manifest proving the whole pipeline holds together.
//!
//! Usage:
//! ```bash
//! lantern proof-run --anchors optional --events 25
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use ed25519_dalek::SigningKey;
use lantern_anchor::{AnchorError, AnchorsMode};
use lantern_canon::{canon, RawValue};
use lantern_chain::{AppendFields, AuditChain, ChainConfig};
use lantern_checkpoint::{CheckpointSigner, SigningKeyProvider, StaticSigningKeyProvider};
use lantern_export::{export, ExportRange};
use lantern_verify::{verify_pack, Verdict};
use rand_core::OsRng;
use serde::Serialize;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AnchorsArg {
    Required,
    Optional,
}

#[derive(Args)]
pub struct ProofRunArgs {
    /// How many synthetic events to append before exporting
    #[arg(long, default_value_t = 10)]
    events: u32,

    /// Whether the anchor subsystem must produce more than log-only receipts
    #[arg(long, value_enum, default_value_t = AnchorsArg::Optional)]
    anchors: AnchorsArg,

    /// Where to write the signed proof-run manifest
    #[arg(long, default_value = "proof-run-manifest.json", value_name = "FILE")]
    manifest: PathBuf,
}

#[derive(Debug, Serialize)]
struct ProofManifest {
    events_generated: u32,
    anchors_mode: &'static str,
    anchor_backend: String,
    anchor_receipts: usize,
    pre_tamper_verdict: String,
    tamper_detected: bool,
    tamper_detected_at_seq: Option<u64>,
    kid: String,
    signature: String,
}

pub async fn run(args: ProofRunArgs, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "Lantern Proof Run".bold().cyan());
    println!("{}", "═".repeat(44).cyan());
    println!();

    let mut app_config = crate::config::load(config_path.as_ref())?;
    let anchors_mode = match args.anchors {
        AnchorsArg::Required => AnchorsMode::Required,
        AnchorsArg::Optional => AnchorsMode::Optional,
    };
    app_config.anchor.anchors_mode = anchors_mode;

    let anchor_backend = match app_config.anchor.build() {
        Ok(backend) => backend,
        Err(AnchorError::AnchorRequiredNotSatisfied) => {
            crate::print_error(
                "anchors=required, but only the log-only backend is configured — set \
                 `[anchor] type = \"s3-worm\"`, `\"rfc3161\"`, or `\"both\"` in lantern.toml \
                 (or LANTERN_ANCHOR_TYPE) to satisfy it",
            );
            std::process::exit(1);
        }
        Err(err) => return Err(err).context("building anchor backend from configuration"),
    };
    let anchor_backend_name = anchor_backend.name().to_string();

    let signing_key = SigningKey::generate(&mut OsRng);
    let kid = "proof-run".to_string();
    let provider = Arc::new(StaticSigningKeyProvider::new(kid.clone(), signing_key));
    let signer = CheckpointSigner::new(provider.clone());

    let mut chain_config = ChainConfig::memory();
    chain_config.checkpoint_interval = Some(5);
    let chain = AuditChain::open(chain_config, Some(signer))
        .await
        .context("opening proof-run chain")?
        .with_anchor(anchor_backend, anchors_mode);

    for i in 0..args.events {
        chain
            .append_event(AppendFields {
                action: "proof-run.event".to_string(),
                actor: "lantern-proof-run".to_string(),
                receipt_id: None,
                export_id: None,
                saved_view_id: None,
                payload: serde_json::json!({ "index": i }).to_string(),
                ip: None,
                user_agent: None,
            })
            .await
            .context("appending synthetic event")?;
    }
    crate::print_success(&format!("appended {} events", args.events));

    let pack = export(&chain, ExportRange::default())
        .await
        .context("exporting proof-run pack")?;
    crate::print_success(&format!(
        "exported {} events ({} anchor receipts via `{anchor_backend_name}`) to an in-memory pack",
        pack.events.len(),
        pack.anchor_receipts.len()
    ));

    let report = verify_pack(&pack, None, true).context("verifying proof-run pack")?;
    let pre_tamper_verdict = format!("{:?}", report.verdict);
    if report.is_pass() {
        crate::print_success("pre-tamper verification: PASS");
    } else {
        crate::print_error("pre-tamper verification unexpectedly failed");
        anyhow::bail!("proof run invariant violated: freshly exported pack failed verification");
    }

    let mut tampered_events = pack.events.clone();
    let victim_idx = tampered_events.len() / 2;
    let tampered_seq = tampered_events[victim_idx].seq;
    // Flip one ASCII byte of `action` (a plain string field, never
    // re-parsed as JSON) so the tamper is exactly one byte wide. The
    // tampered pack is then re-hashed as an attacker who also forged the
    // file-level `pack_hash` would — so what actually catches this is
    // chain replay, not the (bypassable) file tripwire.
    let mut action_bytes = tampered_events[victim_idx].action.clone().into_bytes();
    let last = action_bytes.len() - 1;
    action_bytes[last] ^= 1;
    tampered_events[victim_idx].action = String::from_utf8(action_bytes)
        .expect("flipping the low bit of an ASCII byte stays valid UTF-8");

    let tampered = lantern_pack::ForensicPack::build(
        pack.segment.clone(),
        pack.head_at_export_time.clone(),
        pack.verification.clone(),
        pack.manifest.clone(),
        tampered_events,
        pack.checkpoints.clone(),
        pack.anchor_receipts.clone(),
    )?;

    let tamper_report = verify_pack(&tampered, None, true)?;
    let tamper_detected = matches!(tamper_report.verdict, Verdict::Fail { .. });
    if tamper_detected {
        crate::print_success(&format!(
            "tamper test: 1-byte flip at seq {tampered_seq} was detected"
        ));
    } else {
        crate::print_error("tamper test: tampering went undetected");
        anyhow::bail!("proof run invariant violated: tampered pack passed verification");
    }

    let manifest_body = RawValue::map([
        ("events_generated", RawValue::Int(args.events as i64)),
        (
            "anchors_mode",
            RawValue::str(anchors_mode_label(anchors_mode)),
        ),
        ("anchor_backend", RawValue::str(&anchor_backend_name)),
        (
            "anchor_receipts",
            RawValue::Int(pack.anchor_receipts.len() as i64),
        ),
        ("pre_tamper_verdict", RawValue::str(&pre_tamper_verdict)),
        ("tamper_detected", RawValue::Bool(tamper_detected)),
        (
            "tamper_detected_at_seq",
            tamper_report
                .first_bad_seq
                .map(|s| RawValue::Int(s as i64))
                .unwrap_or(RawValue::Null),
        ),
        ("kid", RawValue::str(&kid)),
    ]);
    let signed_bytes = canon(&manifest_body)?;
    let signature = base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        provider.sign(&signed_bytes),
    );

    let manifest = ProofManifest {
        events_generated: args.events,
        anchors_mode: anchors_mode_label(anchors_mode),
        anchor_backend: anchor_backend_name,
        anchor_receipts: pack.anchor_receipts.len(),
        pre_tamper_verdict,
        tamper_detected,
        tamper_detected_at_seq: tamper_report.first_bad_seq,
        kid,
        signature,
    };
    std::fs::write(&args.manifest, serde_json::to_vec_pretty(&manifest)?)
        .with_context(|| format!("writing manifest: {}", args.manifest.display()))?;

    crate::print_success(&format!(
        "wrote signed proof-run manifest to {}",
        args.manifest.display()
    ));
    Ok(())
}

fn anchors_mode_label(mode: AnchorsMode) -> &'static str {
    match mode {
        AnchorsMode::Required => "required",
        AnchorsMode::Optional => "optional",
    }
}

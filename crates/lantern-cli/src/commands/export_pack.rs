//! `lantern export-pack` - export a range of the chain to a forensic pack.
//!
//! Usage:
//! ```bash
//! lantern export-pack --output pack.json --from-seq 1 --to-seq 100
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use lantern_chain::{AuditChain, ChainConfig};
use lantern_export::{export_to_file, ExportRange};

#[derive(Args)]
pub struct ExportPackArgs {
    /// Where to write the forensic pack (written atomically)
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// First event seq to include (defaults to genesis)
    #[arg(long)]
    from_seq: Option<u64>,

    /// Last event seq to include (defaults to the current head)
    #[arg(long)]
    to_seq: Option<u64>,

    /// Also write the exported anchor receipts to this file as JSON
    #[arg(long, value_name = "FILE")]
    anchor_receipts: Option<PathBuf>,
}

pub async fn run(args: ExportPackArgs, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "Lantern Forensic Pack Export".bold().cyan());
    println!("{}", "═".repeat(44).cyan());
    println!();

    let app_config = crate::config::load(config_path.as_ref())?;
    let chain_config = ChainConfig {
        database_url: format!("sqlite://{}?mode=rwc", app_config.chain.db_path),
        checkpoint_interval: Some(app_config.chain.checkpoint_interval),
        ..ChainConfig::default()
    };
    let anchor_backend = app_config
        .anchor
        .build()
        .context("building anchor backend from configuration")?;
    let chain = AuditChain::open(chain_config, None)
        .await
        .context("opening audit chain")?
        .with_anchor(anchor_backend, app_config.anchor.anchors_mode);

    let range = ExportRange {
        from_seq: args.from_seq,
        to_seq: args.to_seq,
    };
    let pack = export_to_file(&chain, range, &args.output)
        .await
        .context("exporting forensic pack")?;

    if let Some(receipts_path) = &args.anchor_receipts {
        let json = serde_json::to_vec_pretty(&pack.anchor_receipts)?;
        std::fs::write(receipts_path, json)
            .with_context(|| format!("writing anchor receipts: {}", receipts_path.display()))?;
    }

    crate::print_success(&format!(
        "exported {} events (seq {}..={}) to {}",
        pack.segment.event_count,
        pack.segment.from_seq,
        pack.segment.to_seq,
        args.output.display()
    ));
    Ok(())
}

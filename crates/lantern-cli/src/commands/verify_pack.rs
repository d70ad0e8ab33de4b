//! `lantern verify-pack` - verify a forensic pack completely offline.
//!
//! Usage:
//! ```bash
//! lantern verify-pack pack.json --public-key keys/ --strict-kid
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use lantern_checkpoint::KeyRing;
use lantern_pack::ForensicPack;
use lantern_verify::{verify_pack, Verdict};

#[derive(Args)]
pub struct VerifyPackArgs {
    /// Path to the forensic pack JSON file
    pack: PathBuf,

    /// Public key: a single PEM file (kid = "default") or a directory of
    /// `<kid>.pem` files
    #[arg(long, value_name = "FILE|DIR")]
    public_key: Option<PathBuf>,

    /// Never fall back to a single-key ring when the checkpoint's kid is
    /// absent from the ring
    #[arg(long)]
    strict_kid: bool,
}

pub async fn run(args: VerifyPackArgs) -> Result<()> {
    println!("{}", "Lantern Forensic Pack Verification".bold().cyan());
    println!("{}", "═".repeat(44).cyan());
    println!();

    let content = std::fs::read_to_string(&args.pack)
        .with_context(|| format!("reading pack file: {}", args.pack.display()))?;
    let pack: ForensicPack =
        serde_json::from_str(&content).context("parsing forensic pack JSON")?;

    let key_ring = match &args.public_key {
        Some(path) if path.is_dir() => Some(KeyRing::from_dir(path)?),
        Some(path) => Some(KeyRing::from_single_file(path)?),
        None => None,
    };

    let report = verify_pack(&pack, key_ring.as_ref(), args.strict_kid)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec![Cell::new("field"), Cell::new("value")]);
    table.add_row(vec![Cell::new("pack"), Cell::new(args.pack.display())]);
    table.add_row(vec![
        Cell::new("chain_status"),
        Cell::new(format!("{:?}", report.chain_status)),
    ]);
    table.add_row(vec![
        Cell::new("checked_events"),
        Cell::new(report.checked_events),
    ]);
    table.add_row(vec![
        Cell::new("coverage"),
        Cell::new(format!("{:?}", report.coverage)),
    ]);
    table.add_row(vec![Cell::new("anchors"), Cell::new(&report.anchor_note)]);
    println!("{table}");
    println!();

    match &report.verdict {
        Verdict::Pass => {
            crate::print_success("PASS — chain verified, no tampering detected");
            Ok(())
        }
        Verdict::Fail { reason } => {
            crate::print_error(&format!("FAIL — {reason}"));
            if let Some(seq) = report.first_bad_seq {
                println!("  first failing seq: {}", seq.to_string().red().bold());
            }
            std::process::exit(1);
        }
    }
}

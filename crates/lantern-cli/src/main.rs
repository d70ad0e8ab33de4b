//! Lantern CLI - command-line interface for the tamper-evident audit ledger.
//!
//! # Usage
//!
//! ```bash
//! # Verify an exported forensic pack
//! lantern verify-pack pack.json --public-key keys/
//!
//! # Export a range of the chain to a forensic pack
//! lantern export-pack --output pack.json --from-seq 1 --to-seq 100
//!
//! # Generate events, export, verify, tamper-test, and report
//! lantern proof-run --anchors optional
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod config;

use commands::{export_pack, proof_run, verify_pack};

/// Lantern - tamper-evident audit ledger CLI.
#[derive(Parser)]
#[command(
    name = "lantern",
    version,
    about = "Lantern CLI - tamper-evident audit ledger, signed checkpoints, offline verification",
    long_about = "Lantern maintains an append-only, hash-chained audit ledger with \
                  periodic signed checkpoints and optional external anchoring. \
                  This CLI exports forensic packs and verifies them completely offline."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a lantern.toml configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a forensic pack completely offline
    #[command(name = "verify-pack")]
    VerifyPack(verify_pack::VerifyPackArgs),

    /// Export a range of the chain to a forensic pack
    #[command(name = "export-pack")]
    ExportPack(export_pack::ExportPackArgs),

    /// Generate events, export, verify, and run a tamper-detection proof
    #[command(name = "proof-run")]
    ProofRun(proof_run::ProofRunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    setup_logging(cli.verbose);

    // Execute command
    match cli.command {
        Commands::VerifyPack(args) => verify_pack::run(args).await,
        Commands::ExportPack(args) => export_pack::run(args, cli.config).await,
        Commands::ProofRun(args) => proof_run::run(args, cli.config).await,
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message with an X
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

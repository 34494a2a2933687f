//! # taxpulse CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// TaxPulse — deterministic Philippine tax computation.
///
/// Checks tax packs and computes VAT and withholding returns from
/// transaction extracts.
#[derive(Parser, Debug)]
#[command(name = "taxpulse", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Load a tax pack and report what is in effect.
    CheckPack(taxpulse_cli::check_pack::CheckPackArgs),
    /// Compute one return from a transaction extract.
    Compute(taxpulse_cli::compute::ComputeArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CheckPack(args) => taxpulse_cli::check_pack::run(args),
        Commands::Compute(args) => taxpulse_cli::compute::run(args),
    }
}

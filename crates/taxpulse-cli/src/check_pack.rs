//! # Check-Pack Subcommand
//!
//! Loads a tax pack, resolves a snapshot, and reports what is in
//! effect. Exits nonzero on any configuration defect, so packs can be
//! checked in CI before deployment.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use taxpulse_core::TaxType;
use taxpulse_registry::load_pack;

/// Arguments for the check-pack subcommand.
#[derive(Args, Debug)]
pub struct CheckPackArgs {
    /// Path to the tax pack directory.
    #[arg(long)]
    pub pack: PathBuf,

    /// Date to resolve the snapshot for (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub as_of: Option<chrono::NaiveDate>,
}

/// Load and check the pack, printing a summary of the snapshot.
pub fn run(args: CheckPackArgs) -> anyhow::Result<()> {
    let registry = load_pack(&args.pack)
        .with_context(|| format!("pack {} failed to load", args.pack.display()))?;
    let as_of = args
        .as_of
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let snapshot = registry
        .snapshot_as_of(as_of)
        .with_context(|| format!("pack {} has no valid snapshot on {as_of}", args.pack.display()))?;

    println!("pack {} OK as of {as_of}", args.pack.display());
    for tax_type in [TaxType::Vat, TaxType::Ewt, TaxType::Fwt] {
        let txn_rules = snapshot.transaction_rules_for(tax_type).count();
        let agg_rules = snapshot.aggregate_rules_for(tax_type).count();
        if txn_rules + agg_rules > 0 {
            println!("  {tax_type}: {txn_rules} transaction rule(s), {agg_rules} aggregate rule(s)");
        }
    }
    println!(
        "  {} transaction validation(s), {} aggregate validation(s), {} mapping(s)",
        snapshot.transaction_validations().len(),
        snapshot.aggregate_validations().len(),
        snapshot.mappings().count(),
    );
    Ok(())
}

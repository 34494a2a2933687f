//! # Compute Subcommand
//!
//! One-shot return computation: load a pack, read a JSON transaction
//! extract, run the pipeline, and print form lines and findings. With
//! `--json` the full outcome is emitted for downstream tooling.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;

use taxpulse_core::{CompanyCode, Period, TaxType, Transaction};
use taxpulse_registry::load_pack;
use taxpulse_run::{compute, ControlTotals, RunConfig, RunRequest};

/// Arguments for the compute subcommand.
#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Path to the tax pack directory.
    #[arg(long)]
    pub pack: PathBuf,

    /// Path to a JSON array of transactions.
    #[arg(long)]
    pub transactions: PathBuf,

    /// Company code to compute for.
    #[arg(long)]
    pub company: String,

    /// Tax type: VAT, EWT, or FWT.
    #[arg(long)]
    pub tax_type: TaxType,

    /// Filing period, YYYY-MM or YYYY-Qn.
    #[arg(long)]
    pub period: Period,

    /// GL control account balance to reconcile against.
    #[arg(long)]
    pub ledger: Option<Decimal>,

    /// Tax subledger total to reconcile against.
    #[arg(long)]
    pub subledger: Option<Decimal>,

    /// Prior filed return's control amount.
    #[arg(long)]
    pub prior: Option<Decimal>,

    /// Emit the full outcome as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

/// Run the pipeline once and print the outcome.
pub fn run(args: ComputeArgs) -> anyhow::Result<()> {
    let registry = load_pack(&args.pack)
        .with_context(|| format!("pack {} failed to load", args.pack.display()))?;
    let text = fs::read_to_string(&args.transactions)
        .with_context(|| format!("cannot read {}", args.transactions.display()))?;
    let transactions: Vec<Transaction> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a transaction array", args.transactions.display()))?;
    tracing::info!(
        pack = %args.pack.display(),
        transactions = transactions.len(),
        "inputs loaded"
    );

    let request = RunRequest {
        company_code: CompanyCode::new(args.company),
        tax_type: args.tax_type,
        period: args.period,
        transactions: &transactions,
        controls: ControlTotals {
            ledger_balance: args.ledger,
            subledger_total: args.subledger,
        },
        prior_amount: args.prior,
    };
    let outcome = compute(&registry, &RunConfig::default(), &request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "{} {} {}: {} transaction(s), control amount {}",
        request.company_code, request.tax_type, request.period,
        outcome.transaction_count, outcome.control_amount,
    );
    for line in &outcome.lines.lines {
        println!(
            "  {} line {:>7}  {:>15}  {}",
            line.form_id, line.line_code, line.amount, line.line_label
        );
    }
    for recon in &outcome.reconciliations {
        println!(
            "  recon {:<22} {:>5}  (diff {})",
            recon.recon_type.to_string(),
            recon.verdict.to_string(),
            recon.difference,
        );
    }
    for violation in &outcome.report.violations {
        println!("  [{}] {}: {}", violation.level, violation.rule_code, violation.message);
    }
    if outcome.report.has_blocking() {
        anyhow::bail!("return has blocking validation errors");
    }
    Ok(())
}

//! # The Compute Pipeline
//!
//! One call, six stages, no partial output:
//!
//! 1. Pin a registry snapshot as of the period end.
//! 2. Scope transactions to the company, period, and tax type.
//! 3. Apply transaction rules into buckets.
//! 4. Derive aggregate buckets.
//! 5. Reconcile the control figure against ledger, subledger, and the
//!    prior period.
//! 6. Run validations and map buckets to form lines.
//!
//! Everything downstream of the snapshot is deterministic: bucket
//! accumulation is commutative, iteration orders are fixed by sorted
//! containers, and violation order follows (input order, rule code).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use taxpulse_core::{BucketName, CompanyCode, Period, TaxType, Transaction};
use taxpulse_engine::{
    apply_transaction, map_lines, run_aggregates, Buckets, MappedLines, RuleDiagnostic,
};
use taxpulse_recon::{
    reconcile_ledger, reconcile_prior_period, reconcile_subledger, ReconConfig,
    ReconciliationResult,
};
use taxpulse_registry::Registry;
use taxpulse_state::ValidationSummary;
use taxpulse_validation::{
    diagnostic_violations, validate_aggregate, validate_transactions, AggregateContext,
    ValidationReport,
};

use crate::error::RunError;

/// Run-level configuration: which bucket carries each tax type's
/// control figure, and the reconciliation tolerances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// The bucket whose final amount is reconciled and carried between
    /// periods, per tax type.
    pub control_buckets: BTreeMap<TaxType, BucketName>,
    /// Reconciliation tolerances.
    pub recon: ReconConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        let control_buckets = [
            (TaxType::Vat, BucketName::new("VAT_PAYABLE")),
            (TaxType::Ewt, BucketName::new("EWT_TOTAL")),
            (TaxType::Fwt, BucketName::new("FWT_TOTAL")),
        ]
        .into_iter()
        .collect();
        Self {
            control_buckets,
            recon: ReconConfig::default(),
        }
    }
}

/// Externally sourced control figures for reconciliation. An absent
/// figure skips that comparison.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ControlTotals {
    /// GL control account balance for the period.
    pub ledger_balance: Option<Decimal>,
    /// Tax subledger total for the period.
    pub subledger_total: Option<Decimal>,
}

/// One compute request.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    /// Company to compute for.
    pub company_code: CompanyCode,
    /// Tax obligation to compute.
    pub tax_type: TaxType,
    /// Filing period.
    pub period: Period,
    /// Candidate transactions; the pipeline scopes them itself.
    pub transactions: &'a [Transaction],
    /// External figures to reconcile against.
    pub controls: ControlTotals,
    /// The prior filed return's control amount, if one exists.
    pub prior_amount: Option<Decimal>,
}

/// The complete computed artifact set for one return version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// The date the registry snapshot was pinned for.
    pub snapshot_date: NaiveDate,
    /// Transactions in scope after filtering.
    pub transaction_count: usize,
    /// Final bucket state.
    pub buckets: Buckets,
    /// Form lines and unmapped buckets.
    pub lines: MappedLines,
    /// Completed reconciliations, in ledger/subledger/prior order.
    pub reconciliations: Vec<ReconciliationResult>,
    /// All validation findings.
    pub report: ValidationReport,
    /// The control figure the reconciliations compared.
    pub control_amount: Decimal,
}

impl RunOutcome {
    /// The counts the lifecycle guards act on.
    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary {
            errors: self.report.errors().count(),
            warnings: self.report.warnings().count(),
        }
    }
}

/// Run the full pipeline for one (company, tax type, period).
pub fn compute(
    registry: &Registry,
    config: &RunConfig,
    request: &RunRequest<'_>,
) -> Result<RunOutcome, RunError> {
    let snapshot_date = request.period.end();
    let snapshot = registry.snapshot_as_of(snapshot_date)?;

    let in_scope: Vec<&Transaction> = request
        .transactions
        .iter()
        .filter(|txn| {
            txn.company_code == request.company_code
                && txn.tax_type == request.tax_type
                && request.period.contains(txn.doc_date)
        })
        .collect();
    tracing::info!(
        company = %request.company_code,
        tax_type = %request.tax_type,
        period = %request.period,
        candidates = request.transactions.len(),
        in_scope = in_scope.len(),
        "computing return"
    );

    let mut buckets = Buckets::new();
    let mut diagnostics: Vec<RuleDiagnostic> = Vec::new();
    for txn in &in_scope {
        apply_transaction(txn, &snapshot, &mut buckets, &mut diagnostics);
    }
    run_aggregates(&mut buckets, &snapshot, request.tax_type, &mut diagnostics);

    let control_bucket = config.control_buckets.get(&request.tax_type);
    let control_amount = control_bucket
        .map(|bucket| buckets.amount(bucket))
        .unwrap_or(Decimal::ZERO);

    let mut reconciliations = Vec::new();
    if let Some(ledger) = request.controls.ledger_balance {
        reconciliations.push(reconcile_ledger(&config.recon, ledger, control_amount));
    }
    if let Some(subledger) = request.controls.subledger_total {
        reconciliations.push(reconcile_subledger(&config.recon, subledger, control_amount));
    }
    reconciliations.push(reconcile_prior_period(
        &config.recon,
        request.prior_amount,
        control_amount,
    ));

    let owned: Vec<Transaction> = in_scope.iter().map(|t| (*t).clone()).collect();
    let mut violations = validate_transactions(&owned, &snapshot);
    let ctx = AggregateContext::new(&buckets, &reconciliations);
    violations.extend(validate_aggregate(&ctx, &snapshot));
    violations.extend(diagnostic_violations(&diagnostics));
    let report = ValidationReport { violations };

    let lines = map_lines(&buckets, &snapshot);

    tracing::info!(
        buckets = buckets.len(),
        violations = report.violations.len(),
        %control_amount,
        "return computed"
    );

    Ok(RunOutcome {
        snapshot_date,
        transaction_count: in_scope.len(),
        buckets,
        lines,
        reconciliations,
        report,
        control_amount,
    })
}

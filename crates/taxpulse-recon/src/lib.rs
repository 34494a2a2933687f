//! # taxpulse-recon — Return Reconciliation
//!
//! Cross-checks a computed return against figures produced outside the
//! rule engine before anyone reviews it:
//!
//! - **Ledger vs return** — the return's control figure against the GL
//!   control account balance. A mismatch beyond tolerance fails: the
//!   books and the return disagree.
//! - **Subledger vs return** — the same figure against the tax
//!   subledger total, under the same comparator: beyond tolerance fails.
//! - **Period vs prior** — this period's figure against the prior filed
//!   return. A swing beyond the variance threshold warns; a first filing
//!   with no prior passes with no variance computed.
//!
//! Verdicts never mutate anything. The validation layer exposes them as
//! fields that validation rules can condition on, so packs decide how a
//! failed reconciliation affects the return lifecycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use taxpulse_core::{percent_change, round_centavos};

/// Which comparison a reconciliation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconType {
    /// Return control figure vs general ledger balance.
    LedgerVsReturn,
    /// Return control figure vs tax subledger total.
    SubledgerVsReturn,
    /// This period's figure vs the prior filed return's.
    PeriodVsPrior,
}

impl ReconType {
    /// The field name validation rules see this verdict under.
    pub fn field_name(self) -> &'static str {
        match self {
            ReconType::LedgerVsReturn => "recon_ledger",
            ReconType::SubledgerVsReturn => "recon_subledger",
            ReconType::PeriodVsPrior => "recon_prior_period",
        }
    }
}

impl std::fmt::Display for ReconType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReconType::LedgerVsReturn => "ledger_vs_return",
            ReconType::SubledgerVsReturn => "subledger_vs_return",
            ReconType::PeriodVsPrior => "period_vs_prior",
        };
        f.write_str(label)
    }
}

/// Reconciliation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Within tolerance.
    Pass,
    /// Outside tolerance; review recommended.
    Warn,
    /// Outside tolerance on a comparison that must agree.
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Pass => "pass",
            Verdict::Warn => "warn",
            Verdict::Fail => "fail",
        };
        f.write_str(label)
    }
}

/// Tolerances for the three comparisons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Maximum absolute difference treated as agreement, in currency
    /// units. Differences exactly at the tolerance pass.
    pub amount_tolerance: Decimal,
    /// Percent swing vs the prior period above which the variance warns.
    pub variance_warn_pct: Decimal,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: taxpulse_core::default_tolerance(),
            variance_warn_pct: Decimal::new(30, 0),
        }
    }
}

/// One completed reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// The comparison performed.
    pub recon_type: ReconType,
    /// The externally sourced figure (ledger balance, subledger total,
    /// or prior period amount).
    pub expected: Decimal,
    /// The figure computed on this return.
    pub actual: Decimal,
    /// `actual - expected`, rounded to centavos.
    pub difference: Decimal,
    /// Percent change vs `expected`; `None` when `expected` is zero or
    /// there is no prior period.
    pub variance_pct: Option<Decimal>,
    /// The outcome.
    pub verdict: Verdict,
}

/// Compare the return figure against a ledger control balance.
pub fn reconcile_ledger(
    config: &ReconConfig,
    ledger_balance: Decimal,
    return_amount: Decimal,
) -> ReconciliationResult {
    compare_amounts(
        config,
        ReconType::LedgerVsReturn,
        ledger_balance,
        return_amount,
        Verdict::Fail,
    )
}

/// Compare the return figure against a subledger total.
///
/// The comparator is identical to the ledger check: a mismatch beyond
/// tolerance fails.
pub fn reconcile_subledger(
    config: &ReconConfig,
    subledger_total: Decimal,
    return_amount: Decimal,
) -> ReconciliationResult {
    compare_amounts(
        config,
        ReconType::SubledgerVsReturn,
        subledger_total,
        return_amount,
        Verdict::Fail,
    )
}

/// Compare the return figure against the prior filed return's.
///
/// `prior_amount` is `None` on a first filing; the comparison passes and
/// no variance is computed.
pub fn reconcile_prior_period(
    config: &ReconConfig,
    prior_amount: Option<Decimal>,
    return_amount: Decimal,
) -> ReconciliationResult {
    let Some(prior) = prior_amount else {
        return ReconciliationResult {
            recon_type: ReconType::PeriodVsPrior,
            expected: Decimal::ZERO,
            actual: return_amount,
            difference: round_centavos(return_amount),
            variance_pct: None,
            verdict: Verdict::Pass,
        };
    };

    let difference = round_centavos(return_amount - prior);
    let variance_pct = percent_change(return_amount, prior);
    let verdict = match variance_pct {
        Some(pct) if pct.abs() > config.variance_warn_pct => Verdict::Warn,
        // A prior of zero yields no defined variance; any movement warns.
        None if difference.abs() > config.amount_tolerance => Verdict::Warn,
        _ => Verdict::Pass,
    };
    if verdict != Verdict::Pass {
        tracing::debug!(recon = %ReconType::PeriodVsPrior, %difference, "variance outside threshold");
    }

    ReconciliationResult {
        recon_type: ReconType::PeriodVsPrior,
        expected: prior,
        actual: return_amount,
        difference,
        variance_pct,
        verdict,
    }
}

fn compare_amounts(
    config: &ReconConfig,
    recon_type: ReconType,
    expected: Decimal,
    actual: Decimal,
    on_mismatch: Verdict,
) -> ReconciliationResult {
    let difference = round_centavos(actual - expected);
    let verdict = if difference.abs() <= config.amount_tolerance {
        Verdict::Pass
    } else {
        tracing::debug!(recon = %recon_type, %expected, %actual, "reconciliation mismatch");
        on_mismatch
    };
    ReconciliationResult {
        recon_type,
        expected,
        actual,
        difference,
        variance_pct: percent_change(actual, expected),
        verdict,
    }
}

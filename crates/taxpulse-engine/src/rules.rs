//! # Transaction Rule Application
//!
//! Runs every in-effect transaction rule for a transaction's tax type,
//! in (priority, code) order. Each matching rule computes one rounded
//! amount and accumulates it into the rule's output bucket; when several
//! rules match one transaction, every one of them contributes.

use rust_decimal::Decimal;

use taxpulse_core::{round_centavos, FieldContext, FieldValue, Transaction};
use taxpulse_expr::ScalarBindings;
use taxpulse_registry::{RegistrySnapshot, TaxRule};

use crate::buckets::Buckets;
use crate::diag::{DiagnosticKind, RuleDiagnostic};

/// Apply every matching transaction rule, accumulating rounded amounts
/// into `buckets` and recording any per-rule failures in `diagnostics`.
pub fn apply_transaction(
    txn: &Transaction,
    snapshot: &RegistrySnapshot,
    buckets: &mut Buckets,
    diagnostics: &mut Vec<RuleDiagnostic>,
) {
    for rule in snapshot.transaction_rules_for(txn.tax_type) {
        if !rule.condition.evaluate(txn) {
            continue;
        }
        match compute_amount(txn, rule, snapshot) {
            Ok(amount) => {
                let amount = round_centavos(amount);
                // Contra documents reverse their original's contribution.
                let amount = if txn.doc_type.is_contra() { -amount } else { amount };
                tracing::trace!(
                    txn = %txn.txn_id,
                    rule = %rule.code,
                    bucket = %rule.output_bucket,
                    %amount,
                    "rule matched"
                );
                buckets.accumulate(rule.output_bucket.clone(), amount);
            }
            Err(diagnostic) => {
                tracing::debug!(%diagnostic, "rule produced no amount");
                diagnostics.push(diagnostic);
            }
        }
    }
}

/// Resolve `base` and `rate`, then evaluate the rule's formula.
fn compute_amount(
    txn: &Transaction,
    rule: &TaxRule,
    snapshot: &RegistrySnapshot,
) -> Result<Decimal, RuleDiagnostic> {
    let refs = rule.formula.refs();

    let base = if refs.contains("base") {
        resolve_base(txn, rule)?
    } else {
        Decimal::ZERO
    };

    let rate = if refs.contains("rate") {
        resolve_rate(txn, rule, snapshot)?
    } else {
        Decimal::ZERO
    };

    rule.formula
        .evaluate(&ScalarBindings { base, rate })
        .map_err(|err| RuleDiagnostic {
            txn_id: Some(txn.txn_id.clone()),
            rule_code: rule.code.clone(),
            kind: DiagnosticKind::Formula,
            detail: err.to_string(),
        })
}

fn resolve_base(txn: &Transaction, rule: &TaxRule) -> Result<Decimal, RuleDiagnostic> {
    // base_source presence is checked at load; treat its absence like a
    // non-numeric field rather than panicking.
    let source = rule.base_source.as_deref().unwrap_or("");
    match txn.field(source) {
        FieldValue::Number(value) => Ok(value),
        other => Err(RuleDiagnostic {
            txn_id: Some(txn.txn_id.clone()),
            rule_code: rule.code.clone(),
            kind: DiagnosticKind::MissingBase,
            detail: format!("base source {source:?} is not numeric (found {other:?})"),
        }),
    }
}

fn resolve_rate(
    txn: &Transaction,
    rule: &TaxRule,
    snapshot: &RegistrySnapshot,
) -> Result<Decimal, RuleDiagnostic> {
    let code = rule.rate_code.as_ref().ok_or_else(|| RuleDiagnostic {
        txn_id: Some(txn.txn_id.clone()),
        rule_code: rule.code.clone(),
        kind: DiagnosticKind::MissingRate,
        detail: "rule names no rate code".to_string(),
    })?;
    snapshot.rate(code).ok_or_else(|| RuleDiagnostic {
        txn_id: Some(txn.txn_id.clone()),
        rule_code: rule.code.clone(),
        kind: DiagnosticKind::MissingRate,
        detail: format!("no rate {code} in effect on {}", snapshot.as_of),
    })
}

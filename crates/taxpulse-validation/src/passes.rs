//! The transaction and aggregate validation passes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use taxpulse_core::{
    BucketName, FieldContext, FieldValue, RuleCode, RuleScope, Severity, Transaction,
};
use taxpulse_engine::{Buckets, DiagnosticKind, RuleDiagnostic};
use taxpulse_recon::ReconciliationResult;
use taxpulse_registry::{RegistrySnapshot, ValidationRule};

use crate::violation::{render_template, render_value, Violation};

/// Per-bucket builtins an aggregate condition may bind.
const BUCKET_BUILTIN: &str = "bucket";
const AMOUNT_BUILTIN: &str = "amount";

/// Run every transaction-scope validation rule over every transaction.
///
/// Output order is (transaction input order, rule code order), so equal
/// inputs always produce equal reports.
pub fn validate_transactions(
    txns: &[Transaction],
    snapshot: &RegistrySnapshot,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for txn in txns {
        for rule in snapshot.transaction_validations() {
            if rule.condition.evaluate(txn) {
                violations.push(build_violation(rule, txn, &["txn_id"]));
            }
        }
    }
    violations
}

/// The field namespace the aggregate pass evaluates against: the final
/// bucket state overlaid with the reconciliation verdict fields
/// (`recon_ledger`, `recon_subledger`, `recon_prior_period`).
pub struct AggregateContext<'a> {
    buckets: &'a Buckets,
    verdicts: BTreeMap<&'static str, String>,
}

impl<'a> AggregateContext<'a> {
    /// Build the aggregate namespace from the bucket state and the
    /// completed reconciliations.
    pub fn new(buckets: &'a Buckets, reconciliations: &[ReconciliationResult]) -> Self {
        let verdicts = reconciliations
            .iter()
            .map(|r| (r.recon_type.field_name(), r.verdict.to_string()))
            .collect();
        Self { buckets, verdicts }
    }
}

impl FieldContext for AggregateContext<'_> {
    fn field(&self, name: &str) -> FieldValue {
        match self.verdicts.get(name) {
            Some(verdict) => FieldValue::Text(verdict.clone()),
            None => self.buckets.field(name),
        }
    }
}

/// One bucket's view of the aggregate namespace, with `bucket` and
/// `amount` bound to the bucket under inspection.
struct PerBucketContext<'a> {
    base: &'a AggregateContext<'a>,
    bucket: &'a BucketName,
    amount: Decimal,
}

impl FieldContext for PerBucketContext<'_> {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            BUCKET_BUILTIN => FieldValue::Text(self.bucket.as_str().to_string()),
            AMOUNT_BUILTIN => FieldValue::Number(self.amount),
            _ => self.base.field(name),
        }
    }
}

/// Run every aggregate-scope validation rule.
///
/// A rule whose condition reads `bucket` or `amount` runs once per
/// written bucket; every other rule runs once against the full
/// namespace.
pub fn validate_aggregate(
    ctx: &AggregateContext<'_>,
    snapshot: &RegistrySnapshot,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for rule in snapshot.aggregate_validations() {
        let fields = rule.condition.fields();
        if fields.contains(BUCKET_BUILTIN) || fields.contains(AMOUNT_BUILTIN) {
            for (bucket, amount) in ctx.buckets.iter() {
                let per_bucket = PerBucketContext {
                    base: ctx,
                    bucket,
                    amount: *amount,
                };
                if rule.condition.evaluate(&per_bucket) {
                    violations.push(build_violation(rule, &per_bucket, &[BUCKET_BUILTIN, AMOUNT_BUILTIN]));
                }
            }
        } else if rule.condition.evaluate(ctx) {
            violations.push(build_violation(rule, ctx, &[]));
        }
    }
    violations
}

/// Promote engine diagnostics to warning-level findings.
///
/// A rule that silently produced nothing is exactly the kind of thing a
/// reviewer must see before approving a return.
pub fn diagnostic_violations(diagnostics: &[RuleDiagnostic]) -> Vec<Violation> {
    diagnostics
        .iter()
        .map(|diag| {
            let code = match diag.kind {
                DiagnosticKind::MissingRate => "DIAG-MISSING-RATE",
                DiagnosticKind::MissingBase => "DIAG-MISSING-BASE",
                DiagnosticKind::Formula => "DIAG-FORMULA",
            };
            let mut context = BTreeMap::new();
            context.insert("rule".to_string(), diag.rule_code.to_string());
            if let Some(txn_id) = &diag.txn_id {
                context.insert("txn_id".to_string(), txn_id.to_string());
            }
            Violation {
                rule_code: RuleCode::new(code),
                level: Severity::Warning,
                scope: if diag.txn_id.is_some() {
                    RuleScope::Transaction
                } else {
                    RuleScope::Aggregate
                },
                message: diag.to_string(),
                context,
            }
        })
        .collect()
}

/// Build one violation: render the message template and capture the
/// condition's field values (plus `extra` names) for audit display.
fn build_violation(
    rule: &ValidationRule,
    ctx: &dyn FieldContext,
    extra: &[&str],
) -> Violation {
    let mut context = BTreeMap::new();
    for field in rule.condition.fields() {
        context.insert(field.to_string(), render_value(ctx.field(field)));
    }
    for field in extra {
        context.insert(field.to_string(), render_value(ctx.field(field)));
    }
    let message = render_template(&rule.message, ctx);
    tracing::debug!(rule = %rule.code, level = ?rule.level, %message, "validation rule fired");
    Violation {
        rule_code: rule.code.clone(),
        level: rule.level,
        scope: rule.scope,
        message,
        context,
    }
}

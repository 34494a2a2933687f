//! # Aggregate Bucket Derivation
//!
//! After transaction rules have filled the accumulator buckets,
//! aggregate rules derive summary buckets from them: totals, net
//! payable, carry-over splits. Rules run in (priority, code) order, so a
//! later rule can read a bucket an earlier one derived. Derived buckets
//! are written with replace semantics; re-running the stage is
//! idempotent.

use taxpulse_core::{round_centavos, TaxType};
use taxpulse_registry::RegistrySnapshot;

use crate::buckets::Buckets;
use crate::diag::{DiagnosticKind, RuleDiagnostic};

/// Run every in-effect aggregate rule for one tax type over the buckets.
pub fn run_aggregates(
    buckets: &mut Buckets,
    snapshot: &RegistrySnapshot,
    tax_type: TaxType,
    diagnostics: &mut Vec<RuleDiagnostic>,
) {
    for rule in snapshot.aggregate_rules_for(tax_type) {
        if !rule.condition.evaluate(buckets) {
            continue;
        }
        match rule.formula.evaluate(buckets) {
            Ok(amount) => {
                let amount = round_centavos(amount);
                tracing::trace!(rule = %rule.code, bucket = %rule.output_bucket, %amount, "aggregate derived");
                buckets.set(rule.output_bucket.clone(), amount);
            }
            Err(err) => diagnostics.push(RuleDiagnostic {
                txn_id: None,
                rule_code: rule.code.clone(),
                kind: DiagnosticKind::Formula,
                detail: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use taxpulse_core::BucketName;
    use taxpulse_registry::{Registry, RegistrySnapshot, TaxRule};

    fn agg_snapshot(rule_yaml: &[&str]) -> RegistrySnapshot {
        let rules: Vec<TaxRule> = rule_yaml
            .iter()
            .map(|y| serde_yaml::from_str(y).unwrap())
            .collect();
        Registry::new(vec![], rules, vec![], vec![])
            .unwrap()
            .snapshot_as_of(NaiveDate::from_ymd_opt(2025, 7, 31).unwrap())
            .unwrap()
    }

    #[test]
    fn test_payable_derivation_reads_earlier_output() {
        let snap = agg_snapshot(&[
            r#"
            code: VAT-AGG-OUTPUT
            tax_type: VAT
            scope: aggregate
            priority: 100
            condition: always
            formula: SUM(VAT_OUTPUT_12, VAT_OUTPUT_0)
            output_bucket: VAT_OUTPUT_TOTAL
            valid_from: 2018-01-01
            "#,
            r#"
            code: VAT-AGG-PAYABLE
            tax_type: VAT
            scope: aggregate
            priority: 200
            condition: always
            formula: VAT_OUTPUT_TOTAL - VAT_INPUT_TOTAL
            output_bucket: VAT_PAYABLE
            valid_from: 2018-01-01
            "#,
        ]);

        let mut buckets: Buckets = [
            (BucketName::new("VAT_OUTPUT_12"), dec!(42000.00)),
            (BucketName::new("VAT_INPUT_TOTAL"), dec!(11160.00)),
        ]
        .into_iter()
        .collect();

        let mut diags = Vec::new();
        run_aggregates(&mut buckets, &snap, TaxType::Vat, &mut diags);

        assert!(diags.is_empty());
        // VAT_OUTPUT_0 was never written and reads as zero.
        assert_eq!(buckets.amount(&BucketName::new("VAT_OUTPUT_TOTAL")), dec!(42000.00));
        assert_eq!(buckets.amount(&BucketName::new("VAT_PAYABLE")), dec!(30840.00));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let snap = agg_snapshot(&[r#"
            code: VAT-AGG-PAYABLE
            tax_type: VAT
            scope: aggregate
            priority: 100
            condition: always
            formula: VAT_OUTPUT_TOTAL - VAT_INPUT_TOTAL
            output_bucket: VAT_PAYABLE
            valid_from: 2018-01-01
            "#]);

        let mut buckets: Buckets = [(BucketName::new("VAT_OUTPUT_TOTAL"), dec!(100))]
            .into_iter()
            .collect();
        let mut diags = Vec::new();
        run_aggregates(&mut buckets, &snap, TaxType::Vat, &mut diags);
        let first = buckets.clone();
        run_aggregates(&mut buckets, &snap, TaxType::Vat, &mut diags);
        assert_eq!(buckets, first);
    }

    #[test]
    fn test_division_by_zero_is_a_diagnostic() {
        let snap = agg_snapshot(&[r#"
            code: VAT-AGG-RATIO
            tax_type: VAT
            scope: aggregate
            priority: 100
            condition: always
            formula: VAT_OUTPUT_TOTAL / SALES_NET
            output_bucket: VAT_RATIO
            valid_from: 2018-01-01
            "#]);

        let mut buckets = Buckets::new();
        let mut diags = Vec::new();
        run_aggregates(&mut buckets, &snap, TaxType::Vat, &mut diags);

        assert!(!buckets.contains(&BucketName::new("VAT_RATIO")));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Formula);
        assert!(diags[0].txn_id.is_none());
    }

    #[test]
    fn test_condition_gates_derivation() {
        let snap = agg_snapshot(&[r#"
            code: VAT-AGG-CARRY
            tax_type: VAT
            scope: aggregate
            priority: 100
            condition:
              lt: { field: VAT_PAYABLE, value: 0 }
            formula: ABS(VAT_PAYABLE)
            output_bucket: VAT_CARRY_OVER
            valid_from: 2018-01-01
            "#]);

        let mut diags = Vec::new();

        let mut positive: Buckets = [(BucketName::new("VAT_PAYABLE"), dec!(500))]
            .into_iter()
            .collect();
        run_aggregates(&mut positive, &snap, TaxType::Vat, &mut diags);
        assert!(!positive.contains(&BucketName::new("VAT_CARRY_OVER")));

        let mut negative: Buckets = [(BucketName::new("VAT_PAYABLE"), dec!(-750.25))]
            .into_iter()
            .collect();
        run_aggregates(&mut negative, &snap, TaxType::Vat, &mut diags);
        assert_eq!(negative.amount(&BucketName::new("VAT_CARRY_OVER")), dec!(750.25));
    }
}

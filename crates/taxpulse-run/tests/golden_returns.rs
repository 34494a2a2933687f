//! End-to-end computations against the bundled Philippine pack.

use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use taxpulse_core::{
    AtcCode, BucketName, CompanyCode, DocType, Period, TaxType, Tin, Transaction, TxnId,
};
use taxpulse_registry::{load_pack, Registry};
use taxpulse_run::{compute, ControlTotals, RunConfig, RunRequest};

fn ph_registry() -> Registry {
    let pack = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../packs/ph");
    load_pack(&pack).expect("bundled pack must load")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn base_txn(txn_id: &str, tax_type: TaxType, doc_date: NaiveDate) -> Transaction {
    Transaction {
        txn_id: TxnId::new(txn_id),
        company_code: CompanyCode::new("IPAI"),
        doc_type: DocType::Invoice,
        doc_number: txn_id.to_string(),
        doc_date,
        partner_id: None,
        partner_name: None,
        partner_type: None,
        vendor_type: None,
        partner_tin: Some(Tin::new("123-456-789-000")),
        gross_amount: Decimal::ZERO,
        net_of_vat: Decimal::ZERO,
        vat_amount: Decimal::ZERO,
        withholding_base: Decimal::ZERO,
        tax_code: None,
        tax_type,
        atc_code: None,
        type_tax_use: None,
        gl_account: None,
        cost_center: None,
        project_code: None,
        source_system: None,
        import_batch_id: None,
    }
}

fn vat_sale(txn_id: &str, net: Decimal) -> Transaction {
    let mut txn = base_txn(txn_id, TaxType::Vat, date(2025, 8, 15));
    txn.type_tax_use = Some("sale".to_string());
    txn.net_of_vat = net;
    txn.gross_amount = net * dec!(1.12);
    txn.vat_amount = net * dec!(0.12);
    txn
}

fn vat_purchase(txn_id: &str, net: Decimal) -> Transaction {
    let mut txn = vat_sale(txn_id, net);
    txn.type_tax_use = Some("purchase".to_string());
    txn
}

fn ewt_bill(txn_id: &str, atc: &str, base: Decimal) -> Transaction {
    let mut txn = base_txn(txn_id, TaxType::Ewt, date(2025, 8, 20));
    txn.atc_code = Some(AtcCode::new(atc));
    txn.withholding_base = base;
    txn.gross_amount = base;
    txn
}

fn vat_request<'a>(txns: &'a [Transaction], ledger: Option<Decimal>) -> RunRequest<'a> {
    RunRequest {
        company_code: CompanyCode::new("IPAI"),
        tax_type: TaxType::Vat,
        period: Period::quarterly(2025, 3).unwrap(),
        transactions: txns,
        controls: ControlTotals {
            ledger_balance: ledger,
            subledger_total: None,
        },
        prior_amount: None,
    }
}

fn bucket(name: &str) -> BucketName {
    BucketName::new(name)
}

#[test]
fn test_quarterly_vat_golden_scenario() {
    let registry = ph_registry();
    let txns = vec![
        vat_sale("SI-1", dec!(150000)),
        vat_sale("SI-2", dec!(120000)),
        vat_sale("SI-3", dec!(80000)),
        vat_purchase("BI-1", dec!(60000)),
        vat_purchase("BI-2", dec!(33000)),
    ];

    let outcome = compute(
        &registry,
        &RunConfig::default(),
        &vat_request(&txns, Some(dec!(30840.00))),
    )
    .unwrap();

    assert_eq!(outcome.transaction_count, 5);
    assert_eq!(outcome.buckets.amount(&bucket("VAT_OUTPUT_TOTAL")), dec!(42000.00));
    assert_eq!(outcome.buckets.amount(&bucket("VAT_INPUT_TOTAL")), dec!(11160.00));
    assert_eq!(outcome.buckets.amount(&bucket("VAT_PAYABLE")), dec!(30840.00));
    assert_eq!(outcome.control_amount, dec!(30840.00));

    // Lines 29 and 34 both carry the payable figure.
    let line = |code: &str| {
        outcome
            .lines
            .lines
            .iter()
            .find(|l| l.line_code == code)
            .unwrap_or_else(|| panic!("line {code} missing"))
    };
    assert_eq!(line("29").amount, dec!(30840.00));
    assert_eq!(line("34").amount, dec!(30840.00));
    assert_eq!(line("31").amount, Decimal::ZERO);

    // Ledger agrees exactly; nothing blocks.
    assert!(!outcome.report.has_blocking());
    // Only the per-rate intermediate buckets carry no form line.
    assert_eq!(
        outcome.lines.unmapped,
        vec![bucket("VAT_INPUT_12"), bucket("VAT_OUTPUT_12")]
    );
}

#[test]
fn test_quarterly_ewt_golden_scenario() {
    let registry = ph_registry();
    let txns = vec![
        ewt_bill("B-1", "W020", dec!(12000)),
        ewt_bill("B-2", "W040", dec!(30000)),
        ewt_bill("B-3", "W157", dec!(45000)),
        ewt_bill("B-4", "W158", dec!(32460)),
        ewt_bill("B-5", "W169", dec!(205000)),
    ];

    let request = RunRequest {
        tax_type: TaxType::Ewt,
        ..vat_request(&txns, None)
    };
    let outcome = compute(&registry, &RunConfig::default(), &request).unwrap();

    assert_eq!(outcome.buckets.amount(&bucket("EWT_W020")), dec!(1800.00));
    assert_eq!(outcome.buckets.amount(&bucket("EWT_W040")), dec!(1500.00));
    assert_eq!(outcome.buckets.amount(&bucket("EWT_W157")), dec!(900.00));
    assert_eq!(outcome.buckets.amount(&bucket("EWT_W158")), dec!(649.20));
    assert_eq!(outcome.buckets.amount(&bucket("EWT_W169")), dec!(2050.00));
    assert_eq!(outcome.buckets.amount(&bucket("EWT_TOTAL")), dec!(6899.20));
    assert_eq!(outcome.control_amount, dec!(6899.20));
    assert!(!outcome.report.has_blocking());
}

#[test]
fn test_professional_fee_withholding_at_ten_percent() {
    let registry = ph_registry();
    let txns = vec![ewt_bill("B-1", "W010", dec!(28000))];

    let request = RunRequest {
        tax_type: TaxType::Ewt,
        ..vat_request(&txns, None)
    };
    let outcome = compute(&registry, &RunConfig::default(), &request).unwrap();

    assert_eq!(outcome.buckets.amount(&bucket("EWT_W010")), dec!(2800.00));
    assert_eq!(outcome.control_amount, dec!(2800.00));
    let line = outcome
        .lines
        .lines
        .iter()
        .find(|l| l.line_code == "14-W010")
        .expect("W010 line present");
    assert_eq!(line.amount, dec!(2800.00));
}

#[test]
fn test_credit_note_reverses_output_tax() {
    let registry = ph_registry();
    let mut credit = vat_sale("CN-1", dec!(20000));
    credit.doc_type = DocType::CreditNote;
    let txns = vec![vat_sale("SI-1", dec!(100000)), credit];

    let outcome = compute(&registry, &RunConfig::default(), &vat_request(&txns, None)).unwrap();

    assert_eq!(outcome.buckets.amount(&bucket("VAT_OUTPUT_TOTAL")), dec!(9600.00));
    assert_eq!(outcome.buckets.amount(&bucket("SALES_NET")), dec!(80000.00));
}

#[test]
fn test_out_of_period_and_other_company_excluded() {
    let registry = ph_registry();
    let mut late = vat_sale("SI-LATE", dec!(50000));
    late.doc_date = date(2025, 10, 1);
    let mut other = vat_sale("SI-OTHER", dec!(50000));
    other.company_code = CompanyCode::new("OTHER");
    let txns = vec![vat_sale("SI-1", dec!(10000)), late, other];

    let outcome = compute(&registry, &RunConfig::default(), &vat_request(&txns, None)).unwrap();

    assert_eq!(outcome.transaction_count, 1);
    assert_eq!(outcome.buckets.amount(&bucket("SALES_NET")), dec!(10000.00));
}

#[test]
fn test_excess_input_tax_becomes_carry_over() {
    let registry = ph_registry();
    let txns = vec![
        vat_sale("SI-1", dec!(10000)),
        vat_purchase("BI-1", dec!(90000)),
    ];

    let outcome = compute(&registry, &RunConfig::default(), &vat_request(&txns, None)).unwrap();

    assert_eq!(outcome.buckets.amount(&bucket("VAT_PAYABLE")), dec!(-9600.00));
    assert_eq!(outcome.buckets.amount(&bucket("VAT_CARRY_OVER")), dec!(9600.00));
    // The negative payable is an expected carry-over case, not a
    // negative-bucket violation.
    assert!(!outcome
        .report
        .violations
        .iter()
        .any(|v| v.rule_code.as_str() == "V-NEG-BUCKET"));
}

#[test]
fn test_negative_gross_invoice_blocks_return() {
    let registry = ph_registry();
    // A reversal booked as a plain invoice instead of a credit note.
    let txns = vec![vat_sale("SI-1", dec!(-50000))];

    let outcome = compute(&registry, &RunConfig::default(), &vat_request(&txns, None)).unwrap();

    let codes: Vec<&str> = outcome
        .report
        .errors()
        .map(|v| v.rule_code.as_str())
        .collect();
    assert!(codes.contains(&"V-NEG-GROSS"));
    assert!(codes.contains(&"V-NEG-BUCKET"));
    assert!(outcome.report.has_blocking());
}

#[test]
fn test_ledger_mismatch_blocks_return() {
    let registry = ph_registry();
    let txns = vec![vat_sale("SI-1", dec!(100000))];

    let outcome = compute(
        &registry,
        &RunConfig::default(),
        &vat_request(&txns, Some(dec!(9999.00))),
    )
    .unwrap();

    assert!(outcome.report.has_blocking());
    assert!(outcome
        .report
        .errors()
        .any(|v| v.rule_code.as_str() == "V-RECON-LEDGER"));
}

#[test]
fn test_subledger_mismatch_blocks_return() {
    let registry = ph_registry();
    let txns = vec![vat_sale("SI-1", dec!(100000))];

    let mut request = vat_request(&txns, None);
    request.controls.subledger_total = Some(dec!(11000.00));
    let outcome = compute(&registry, &RunConfig::default(), &request).unwrap();

    // The subledger break blocks exactly like a ledger break.
    assert!(outcome.report.has_blocking());
    assert!(outcome
        .report
        .errors()
        .any(|v| v.rule_code.as_str() == "V-RECON-SUBLEDGER"));
}

#[test]
fn test_missing_tin_and_atc_surface_as_findings() {
    let registry = ph_registry();
    let mut no_tin = ewt_bill("B-1", "W040", dec!(5000));
    no_tin.partner_tin = None;
    let mut no_atc = ewt_bill("B-2", "W040", dec!(5000));
    no_atc.atc_code = None;
    let txns = vec![no_tin, no_atc];

    let request = RunRequest {
        tax_type: TaxType::Ewt,
        ..vat_request(&txns, None)
    };
    let outcome = compute(&registry, &RunConfig::default(), &request).unwrap();

    let codes: Vec<&str> = outcome
        .report
        .violations
        .iter()
        .map(|v| v.rule_code.as_str())
        .collect();
    assert!(codes.contains(&"V-EWT-NO-TIN"));
    assert!(codes.contains(&"V-EWT-NO-ATC"));
    // The missing ATC is an error, so the return cannot be submitted.
    assert!(outcome.report.has_blocking());
}

#[test]
fn test_unknown_atc_contributes_nothing_and_leaves_no_trace_bucket() {
    let registry = ph_registry();
    let txns = vec![
        ewt_bill("B-1", "W040", dec!(10000)),
        ewt_bill("B-2", "W999", dec!(10000)),
    ];

    let request = RunRequest {
        tax_type: TaxType::Ewt,
        ..vat_request(&txns, None)
    };
    let outcome = compute(&registry, &RunConfig::default(), &request).unwrap();

    // No rule matches W999; only the W040 bill is withheld.
    assert_eq!(outcome.buckets.amount(&bucket("EWT_TOTAL")), dec!(500.00));
}

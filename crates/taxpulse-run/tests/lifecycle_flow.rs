//! Store-level flows: commit semantics, maker-checker transitions,
//! versioning, and prior-period resolution from filed history.

use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use taxpulse_core::{CompanyCode, DocType, Period, TaxType, Tin, Transaction, TxnId};
use taxpulse_recon::{ReconType, Verdict};
use taxpulse_registry::{load_pack, Registry};
use taxpulse_run::{ControlTotals, ReturnStore, RunConfig, RunError, RunRequest};
use taxpulse_state::{Actor, ReturnState, Role};

fn ph_registry() -> Registry {
    let pack = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../packs/ph");
    load_pack(&pack).expect("bundled pack must load")
}

fn vat_sale(txn_id: &str, net: Decimal, doc_date: NaiveDate) -> Transaction {
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
        gross_amount: net * dec!(1.12),
        net_of_vat: net,
        vat_amount: net * dec!(0.12),
        withholding_base: Decimal::ZERO,
        tax_code: None,
        tax_type: TaxType::Vat,
        atc_code: None,
        type_tax_use: Some("sale".to_string()),
        gl_account: None,
        cost_center: None,
        project_code: None,
        source_system: None,
        import_batch_id: None,
    }
}

fn request<'a>(txns: &'a [Transaction], period: Period) -> RunRequest<'a> {
    RunRequest {
        company_code: CompanyCode::new("IPAI"),
        tax_type: TaxType::Vat,
        period,
        transactions: txns,
        controls: ControlTotals::default(),
        prior_amount: None,
    }
}

fn company() -> CompanyCode {
    CompanyCode::new("IPAI")
}

fn q3() -> Period {
    Period::quarterly(2025, 3).unwrap()
}

#[test]
fn test_recompute_updates_open_draft_in_place() {
    let registry = ph_registry();
    let store = ReturnStore::new();
    let config = RunConfig::default();

    let txns_a = vec![vat_sale("SI-1", dec!(10000), NaiveDate::from_ymd_opt(2025, 7, 5).unwrap())];
    let (id_a, _) = store
        .compute_and_commit(&registry, &config, request(&txns_a, q3()))
        .unwrap();

    let txns_b = vec![vat_sale("SI-2", dec!(25000), NaiveDate::from_ymd_opt(2025, 7, 6).unwrap())];
    let (id_b, outcome_b) = store
        .compute_and_commit(&registry, &config, request(&txns_b, q3()))
        .unwrap();

    // Same Draft version, replaced artifacts.
    assert_eq!(id_a, id_b);
    assert_eq!(outcome_b.control_amount, dec!(3000.00));
    assert_eq!(store.versions(&company(), TaxType::Vat, q3()).len(), 1);
}

#[test]
fn test_frozen_return_refuses_recompute() {
    let registry = ph_registry();
    let store = ReturnStore::new();
    let config = RunConfig::default();
    let txns = vec![vat_sale("SI-1", dec!(10000), NaiveDate::from_ymd_opt(2025, 7, 5).unwrap())];

    store
        .compute_and_commit(&registry, &config, request(&txns, q3()))
        .unwrap();
    store
        .submit_for_review(&company(), TaxType::Vat, q3(), Actor::new("alice", Role::Preparer), None)
        .unwrap();

    let err = store
        .compute_and_commit(&registry, &config, request(&txns, q3()))
        .unwrap_err();
    assert!(matches!(
        err,
        RunError::Frozen {
            state: ReturnState::ForReview,
            ..
        }
    ));
}

#[test]
fn test_filed_return_spawns_amendment_version() {
    let registry = ph_registry();
    let store = ReturnStore::new();
    let config = RunConfig::default();
    let txns = vec![vat_sale("SI-1", dec!(10000), NaiveDate::from_ymd_opt(2025, 7, 5).unwrap())];

    store
        .compute_and_commit(&registry, &config, request(&txns, q3()))
        .unwrap();
    store
        .submit_for_review(&company(), TaxType::Vat, q3(), Actor::new("alice", Role::Preparer), None)
        .unwrap();
    store
        .approve(&company(), TaxType::Vat, q3(), Actor::new("bob", Role::Reviewer), None)
        .unwrap();
    store
        .file(
            &company(),
            TaxType::Vat,
            q3(),
            Actor::new("carol", Role::Filer),
            "BIR-EFPS-42".to_string(),
            NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
        )
        .unwrap();

    // An amendment opens as version 2 in Draft; version 1 stays Filed.
    store
        .compute_and_commit(&registry, &config, request(&txns, q3()))
        .unwrap();
    let versions = store.versions(&company(), TaxType::Vat, q3());
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].lifecycle.state, ReturnState::Filed);
    assert_eq!(versions[0].lifecycle.version, 1);
    assert_eq!(versions[1].lifecycle.state, ReturnState::Draft);
    assert_eq!(versions[1].lifecycle.version, 2);
}

#[test]
fn test_prior_period_resolves_from_filed_history() {
    let registry = ph_registry();
    let store = ReturnStore::new();
    let config = RunConfig::default();
    let q2 = Period::quarterly(2025, 2).unwrap();

    // File Q2 with a payable of 1,200.
    let q2_txns = vec![vat_sale("SI-Q2", dec!(10000), NaiveDate::from_ymd_opt(2025, 5, 5).unwrap())];
    store
        .compute_and_commit(&registry, &config, request(&q2_txns, q2))
        .unwrap();
    store
        .submit_for_review(&company(), TaxType::Vat, q2, Actor::new("alice", Role::Preparer), None)
        .unwrap();
    store
        .approve(&company(), TaxType::Vat, q2, Actor::new("bob", Role::Reviewer), None)
        .unwrap();
    store
        .file(
            &company(),
            TaxType::Vat,
            q2,
            Actor::new("carol", Role::Filer),
            "BIR-EFPS-41".to_string(),
            NaiveDate::from_ymd_opt(2025, 7, 25).unwrap(),
        )
        .unwrap();

    // Q3 doubles the payable; the prior comparison warns.
    let q3_txns = vec![vat_sale("SI-Q3", dec!(20000), NaiveDate::from_ymd_opt(2025, 8, 5).unwrap())];
    let (_, outcome) = store
        .compute_and_commit(&registry, &config, request(&q3_txns, q3()))
        .unwrap();

    let prior = outcome
        .reconciliations
        .iter()
        .find(|r| r.recon_type == ReconType::PeriodVsPrior)
        .unwrap();
    assert_eq!(prior.expected, dec!(1200.00));
    assert_eq!(prior.actual, dec!(2400.00));
    assert_eq!(prior.verdict, Verdict::Warn);
    assert!(outcome
        .report
        .warnings()
        .any(|v| v.rule_code.as_str() == "V-PRIOR-VARIANCE"));
}

#[test]
fn test_unfiled_prior_period_is_ignored() {
    let registry = ph_registry();
    let store = ReturnStore::new();
    let config = RunConfig::default();
    let q2 = Period::quarterly(2025, 2).unwrap();

    // Q2 exists but is only Draft; it must not feed the comparison.
    let q2_txns = vec![vat_sale("SI-Q2", dec!(10000), NaiveDate::from_ymd_opt(2025, 5, 5).unwrap())];
    store
        .compute_and_commit(&registry, &config, request(&q2_txns, q2))
        .unwrap();

    let q3_txns = vec![vat_sale("SI-Q3", dec!(20000), NaiveDate::from_ymd_opt(2025, 8, 5).unwrap())];
    let (_, outcome) = store
        .compute_and_commit(&registry, &config, request(&q3_txns, q3()))
        .unwrap();

    let prior = outcome
        .reconciliations
        .iter()
        .find(|r| r.recon_type == ReconType::PeriodVsPrior)
        .unwrap();
    assert_eq!(prior.verdict, Verdict::Pass);
    assert!(prior.variance_pct.is_none());
}

#[test]
fn test_transition_on_unknown_key_errors() {
    let store = ReturnStore::new();
    let err = store
        .submit_for_review(&company(), TaxType::Vat, q3(), Actor::new("alice", Role::Preparer), None)
        .unwrap_err();
    assert!(matches!(err, RunError::UnknownReturn { .. }));
}

#[test]
fn test_submission_with_warnings_needs_acknowledgment() {
    let registry = ph_registry();
    let store = ReturnStore::new();
    let config = RunConfig::default();

    // A withholding bill without a TIN leaves a warning on the return.
    let mut bill = vat_sale("B-1", dec!(0), NaiveDate::from_ymd_opt(2025, 8, 5).unwrap());
    bill.tax_type = TaxType::Ewt;
    bill.partner_tin = None;
    bill.atc_code = Some(taxpulse_core::AtcCode::new("W040"));
    bill.withholding_base = dec!(5000);
    bill.type_tax_use = None;
    let txns = vec![bill];

    let req = RunRequest {
        tax_type: TaxType::Ewt,
        ..request(&txns, q3())
    };
    store.compute_and_commit(&registry, &config, req).unwrap();

    let bare = store.submit_for_review(
        &company(),
        TaxType::Ewt,
        q3(),
        Actor::new("alice", Role::Preparer),
        None,
    );
    assert!(bare.is_err());

    store
        .submit_for_review(
            &company(),
            TaxType::Ewt,
            q3(),
            Actor::new("alice", Role::Preparer),
            Some("TIN requested from vendor, see ticket 881".to_string()),
        )
        .unwrap();
    let current = store.current(&company(), TaxType::Ewt, q3()).unwrap();
    assert_eq!(current.lifecycle.state, ReturnState::ForReview);
}

#[test]
fn test_refused_transitions_append_audit_entries() {
    let registry = ph_registry();
    let store = ReturnStore::new();
    let config = RunConfig::default();

    // A no-TIN withholding bill leaves a warning on the return.
    let mut bill = vat_sale("B-1", dec!(0), NaiveDate::from_ymd_opt(2025, 8, 5).unwrap());
    bill.tax_type = TaxType::Ewt;
    bill.partner_tin = None;
    bill.atc_code = Some(taxpulse_core::AtcCode::new("W040"));
    bill.withholding_base = dec!(5000);
    bill.type_tax_use = None;
    let txns = vec![bill];
    let req = RunRequest {
        tax_type: TaxType::Ewt,
        ..request(&txns, q3())
    };
    store.compute_and_commit(&registry, &config, req).unwrap();

    let audit = || {
        store
            .current(&company(), TaxType::Ewt, q3())
            .unwrap()
            .lifecycle
            .approval_log
    };

    // Submitting without acknowledging the warning is refused and audited.
    assert!(store
        .submit_for_review(&company(), TaxType::Ewt, q3(), Actor::new("alice", Role::Preparer), None)
        .is_err());
    let log = audit();
    assert_eq!(log.len(), 1);
    assert!(!log[0].accepted);
    assert_eq!(log[0].actor.id, "alice");
    assert_eq!(log[0].from_state, ReturnState::Draft);
    assert_eq!(log[0].to_state, ReturnState::ForReview);
    assert!(log[0].comment.as_deref().unwrap().contains("acknowledged"));

    store
        .submit_for_review(
            &company(),
            TaxType::Ewt,
            q3(),
            Actor::new("alice", Role::Preparer),
            Some("TIN requested from vendor".to_string()),
        )
        .unwrap();

    // Self-review and an unacknowledged approval each land in the log.
    assert!(store
        .approve(&company(), TaxType::Ewt, q3(), Actor::new("alice", Role::Reviewer), None)
        .is_err());
    assert!(store
        .approve(&company(), TaxType::Ewt, q3(), Actor::new("bob", Role::Reviewer), None)
        .is_err());
    let log = audit();
    assert_eq!(log.len(), 4);
    assert!(log[2..]
        .iter()
        .all(|e| !e.accepted && e.to_state == ReturnState::Approved));
    assert!(log[2].comment.as_deref().unwrap().contains("cannot review"));
    assert!(log[3].comment.as_deref().unwrap().contains("acknowledged"));

    store
        .approve(
            &company(),
            TaxType::Ewt,
            q3(),
            Actor::new("bob", Role::Reviewer),
            Some("Warnings are timing only".to_string()),
        )
        .unwrap();

    // A preparer cannot file; the refusal is audited too.
    assert!(store
        .file(
            &company(),
            TaxType::Ewt,
            q3(),
            Actor::new("alice", Role::Preparer),
            "REF-9".to_string(),
            NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
        )
        .is_err());
    let log = audit();
    let last = log.last().unwrap();
    assert!(!last.accepted);
    assert_eq!(last.from_state, ReturnState::Approved);
    assert_eq!(last.to_state, ReturnState::Filed);
    assert!(last.comment.as_deref().unwrap().contains("may not perform"));
}

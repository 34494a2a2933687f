//! # taxpulse-core — Foundational Types for the TaxPulse Engine
//!
//! This crate is the bedrock of the TaxPulse workspace. It defines the
//! domain primitives every other crate builds on; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `CompanyCode`, `Tin`,
//!    `AtcCode`, `RuleCode`, `RateCode`, `BucketName` — all newtypes. No
//!    bare strings for identifiers, so a rate code cannot be passed where
//!    a rule code is expected.
//!
//! 2. **One rounding policy.** All monetary results flow through
//!    `money::round_centavos()` — round-half-up to two decimal places.
//!    No ad hoc rounding at call sites.
//!
//! 3. **Closed transaction schema.** `Transaction::FIELD_NAMES` is the
//!    single declaration of which fields rule conditions may reference.
//!    Field lookup on a missing value yields `FieldValue::Null`, never an
//!    error.
//!
//! 4. **Periods are closed intervals.** A filing `Period` (month or
//!    quarter) resolves its own start/end dates; membership tests are the
//!    only way the pipeline scopes transactions to a run.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `taxpulse-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement `Serialize`/`Deserialize`.

pub mod domain;
pub mod fields;
pub mod identity;
pub mod money;
pub mod period;
pub mod txn;

// Re-export primary types for ergonomic imports.
pub use domain::{DocType, RuleScope, Severity, TaxType};
pub use fields::{FieldContext, FieldValue};
pub use identity::{
    AtcCode, BucketName, CompanyCode, FormId, RateCode, ReturnId, RuleCode, Tin, TxnId,
};
pub use money::{default_tolerance, percent_change, round_centavos};
pub use period::{Period, PeriodError};
pub use txn::Transaction;

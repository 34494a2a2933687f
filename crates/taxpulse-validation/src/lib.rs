//! # taxpulse-validation — Return Quality Checks
//!
//! Runs the pack's validation rules over a computed return and collects
//! [`Violation`]s. Validation never mutates the computation; it reads
//! the transactions, the final bucket state, the reconciliation
//! verdicts, and the engine's diagnostics, and reports.
//!
//! Two passes:
//!
//! - **Transaction pass** — each transaction-scope rule runs once per
//!   transaction. A matching condition IS the violation; rule conditions
//!   describe the bad state, not the good one.
//! - **Aggregate pass** — each aggregate-scope rule runs against the
//!   bucket state plus the reconciliation verdict fields. A rule whose
//!   condition reads the `bucket`/`amount` builtins instead runs once
//!   per bucket, which is how packs write "no bucket may be X" checks
//!   without naming every bucket.
//!
//! Engine diagnostics (missing rate, bad base, formula failure) are
//! promoted to warning-level findings so they reach the reviewer
//! through the same channel as pack violations.

pub mod passes;
pub mod violation;

pub use passes::{
    diagnostic_violations, validate_aggregate, validate_transactions, AggregateContext,
};
pub use violation::{render_template, ValidationReport, Violation};

//! # taxpulse-engine — Deterministic Rule Evaluation
//!
//! The computation half of the pipeline: given a pinned registry
//! snapshot and a set of transactions, produce the output buckets and
//! form lines for one return. Evaluation is pure — same snapshot, same
//! transactions, same result, regardless of input order.
//!
//! Three stages, run in sequence by the orchestrator:
//!
//! 1. [`rules::apply_transaction`] — every in-effect transaction rule
//!    whose condition matches contributes a rounded amount to its output
//!    bucket. Credit and debit notes contribute with flipped sign.
//! 2. [`aggregate::run_aggregates`] — aggregate rules derive summary
//!    buckets (totals, payable) from the accumulated ones.
//! 3. [`mapping::map_lines`] — mapped buckets become form lines; buckets
//!    with no mapping are reported, never silently dropped.
//!
//! A rule that cannot produce an amount at runtime (no rate in effect,
//! non-numeric base, division by zero) records a [`diag::RuleDiagnostic`]
//! and contributes nothing. Diagnostics never abort the run; the
//! validation layer decides what they mean for the return.

pub mod aggregate;
pub mod buckets;
pub mod diag;
pub mod mapping;
pub mod rules;

pub use aggregate::run_aggregates;
pub use buckets::Buckets;
pub use diag::{DiagnosticKind, RuleDiagnostic};
pub use mapping::{map_lines, FormLine, MappedLines};
pub use rules::apply_transaction;

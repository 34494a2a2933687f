//! # taxpulse-run — Run Orchestration
//!
//! Ties the engine together: scope transactions to a company and
//! period, pin a registry snapshot, evaluate and aggregate, reconcile
//! against external figures, validate, and map to form lines — then
//! store the result as a versioned return under the maker-checker
//! lifecycle.
//!
//! ## Atomicity and idempotence
//!
//! [`pipeline::compute`] is a pure function of (registry snapshot,
//! transactions, external control figures): it either yields a complete
//! [`RunOutcome`] or an error, never a partial return. Committing to
//! the [`ReturnStore`] replaces the Draft's artifacts in one step, so
//! re-running compute on unchanged inputs is a no-op by value.
//!
//! ## Versioning
//!
//! A (company, tax type, period) key holds a version history. While the
//! newest version is Draft, recomputation updates it in place. Once it
//! is ForReview or Approved the figures are frozen and compute is
//! refused. Once Filed, a new compute opens the next version as an
//! amendment; the filed version is never touched again.

pub mod error;
pub mod pipeline;
pub mod store;

pub use error::RunError;
pub use pipeline::{compute, ControlTotals, RunConfig, RunOutcome, RunRequest};
pub use store::{ReturnStore, StoredReturn};

//! Per-rule computation diagnostics.
//!
//! A diagnostic records that one rule could not produce an amount for
//! one input. The rule contributes nothing and evaluation continues;
//! the validation layer surfaces diagnostics as warnings on the return.

use serde::{Deserialize, Serialize};
use taxpulse_core::{RuleCode, TxnId};

/// Why a rule produced no amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The rule's rate code resolves to no rate in effect on the run date.
    MissingRate,
    /// The rule's base source field did not hold a numeric value.
    MissingBase,
    /// The formula failed at evaluation time (e.g. division by zero).
    Formula,
}

/// One rule's failure to produce an amount for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDiagnostic {
    /// The transaction being evaluated; `None` for aggregate rules.
    pub txn_id: Option<TxnId>,
    /// The rule that failed.
    pub rule_code: RuleCode,
    /// Failure category.
    pub kind: DiagnosticKind,
    /// Human-readable detail.
    pub detail: String,
}

impl std::fmt::Display for RuleDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.txn_id {
            Some(txn) => write!(f, "rule {} on {}: {}", self.rule_code, txn, self.detail),
            None => write!(f, "rule {}: {}", self.rule_code, self.detail),
        }
    }
}

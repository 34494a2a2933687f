//! # Domain Enums
//!
//! The closed enumerations shared across the engine: tax types, document
//! types, rule scopes, and violation severities. Each is exhaustive —
//! adding a variant forces every consumer `match` to handle it.

use serde::{Deserialize, Serialize};

/// The tax obligation a rule, rate, or return belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxType {
    /// Value-Added Tax (BIR Form 2550Q family).
    #[serde(rename = "VAT")]
    Vat,
    /// Expanded Withholding Tax (BIR Form 1601-EQ family).
    #[serde(rename = "EWT")]
    Ewt,
    /// Final Withholding Tax (BIR Form 1601-FQ family).
    #[serde(rename = "FWT")]
    Fwt,
}

impl std::fmt::Display for TaxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Vat => "VAT",
            Self::Ewt => "EWT",
            Self::Fwt => "FWT",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TaxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VAT" => Ok(Self::Vat),
            "EWT" => Ok(Self::Ewt),
            "FWT" => Ok(Self::Fwt),
            other => Err(format!("unknown tax type {other:?}; expected VAT, EWT, or FWT")),
        }
    }
}

/// Source document classification for a transaction.
///
/// Credit and debit notes are contra-entries: amounts computed from them
/// carry an inverted sign when accumulated into buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Customer or vendor invoice.
    Invoice,
    /// Credit note (contra-entry, flips the computed sign).
    CreditNote,
    /// Debit note (contra-entry, flips the computed sign).
    DebitNote,
    /// Manual journal entry.
    JournalEntry,
}

impl DocType {
    /// Whether amounts derived from this document flip their sign.
    pub fn is_contra(&self) -> bool {
        matches!(self, Self::CreditNote | Self::DebitNote)
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Invoice => "invoice",
            Self::CreditNote => "credit_note",
            Self::DebitNote => "debit_note",
            Self::JournalEntry => "journal_entry",
        };
        f.write_str(s)
    }
}

/// Evaluation scope of a tax or validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    /// Evaluated once per source transaction.
    Transaction,
    /// Evaluated over the accumulated bucket state of a run.
    Aggregate,
}

impl std::fmt::Display for RuleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transaction => "transaction",
            Self::Aggregate => "aggregate",
        };
        f.write_str(s)
    }
}

/// Severity level of a validation rule or violation.
///
/// Any `Error` violation blocks the Draft → ForReview transition;
/// `Warning` violations require an acknowledgment comment before approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks submission for review until corrected.
    Error,
    /// Requires explicit acknowledgment before approval.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Warning => "warning",
        };
        f.write_str(s)
    }
}

//! # Registry Records
//!
//! The four effective-dated record shapes a tax pack is made of. Validity
//! is a half-open interval `[valid_from, valid_to)`; `valid_to: None`
//! means open-ended. The `active` flag retires a record without deleting
//! its history.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use taxpulse_core::{BucketName, FormId, RateCode, RuleCode, RuleScope, Severity, TaxType};
use taxpulse_expr::{Condition, Formula};

fn default_active() -> bool {
    true
}

fn default_valid_from() -> NaiveDate {
    NaiveDate::MIN
}

/// An effective-dated tax rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRate {
    /// Rate code rules refer to (e.g. `VAT_12_SALES`, `W010`).
    pub code: RateCode,
    /// The rate as a decimal fraction (0.12 = 12%).
    pub rate: Decimal,
    /// First day the rate is in effect.
    pub valid_from: NaiveDate,
    /// First day the rate is no longer in effect; `None` = open-ended.
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    /// Retirement flag; inactive rates never resolve.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl TaxRate {
    /// Whether the rate is in effect on a date.
    pub fn in_effect(&self, on: NaiveDate) -> bool {
        self.active && on >= self.valid_from && self.valid_to.map_or(true, |to| on < to)
    }
}

/// An effective-dated tax computation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRule {
    /// Unique rule code (e.g. `VAT-OUT-12`).
    pub code: RuleCode,
    /// Tax obligation the rule computes for.
    pub tax_type: TaxType,
    /// Whether the rule runs per transaction or over buckets.
    pub scope: RuleScope,
    /// Trigger predicate; compiled at load.
    pub condition: Condition,
    /// Amount formula; compiled at load.
    pub formula: Formula,
    /// Transaction field the `base` symbol reads from.
    #[serde(default)]
    pub base_source: Option<String>,
    /// Rate code the `rate` symbol resolves through.
    #[serde(default)]
    pub rate_code: Option<RateCode>,
    /// Bucket the computed amount accumulates into.
    pub output_bucket: BucketName,
    /// Evaluation order; lower runs earlier, ties broken by code.
    pub priority: u32,
    /// First day the rule is in effect.
    pub valid_from: NaiveDate,
    /// First day the rule is no longer in effect; `None` = open-ended.
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    /// Retirement flag.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl TaxRule {
    /// Whether the rule is in effect on a date.
    pub fn in_effect(&self, on: NaiveDate) -> bool {
        self.active && on >= self.valid_from && self.valid_to.map_or(true, |to| on < to)
    }
}

/// An effective-dated validation rule.
///
/// The condition is a *trigger* predicate: true means a violation is
/// recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Unique validation code (e.g. `V-NEG-BUCKET`).
    pub code: RuleCode,
    /// Error blocks review; warning requires acknowledgment.
    pub level: Severity,
    /// Whether the rule checks transactions or the aggregate state.
    pub scope: RuleScope,
    /// Trigger predicate; true ⇒ violation.
    pub condition: Condition,
    /// Message template with `%{field}` placeholders.
    pub message: String,
    /// First day the rule is in effect; defaults to the beginning of time.
    #[serde(default = "default_valid_from")]
    pub valid_from: NaiveDate,
    /// First day the rule is no longer in effect; `None` = open-ended.
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    /// Retirement flag.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl ValidationRule {
    /// Whether the rule is in effect on a date.
    pub fn in_effect(&self, on: NaiveDate) -> bool {
        self.active && on >= self.valid_from && self.valid_to.map_or(true, |to| on < to)
    }
}

/// Maps an output bucket to one regulatory form line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputMapping {
    /// The bucket being mapped.
    pub output_bucket: BucketName,
    /// Target form (e.g. `2550Q`).
    pub form_id: FormId,
    /// Line code on the form (e.g. `29`).
    pub line_code: String,
    /// Human-readable line label.
    pub line_label: String,
}

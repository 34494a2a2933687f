//! # Configuration Errors
//!
//! Every way a rule pack can be wrong. All of these are fatal at load or
//! snapshot time — a registry with any of these defects is never handed
//! to the pipeline.

use std::path::PathBuf;

use chrono::NaiveDate;
use taxpulse_core::{BucketName, RateCode, RuleCode};
use taxpulse_expr::FormulaError;
use thiserror::Error;

/// A configuration defect in rules, rates, validations, or mappings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A pack file could not be read.
    #[error("cannot read pack file {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A pack file is not valid YAML or fails AST compilation.
    ///
    /// Condition and formula parsing happen inside deserialization, so
    /// unknown operators, bad arity, and grammar errors all surface here.
    #[error("malformed pack file {path}: {source}")]
    Malformed {
        /// The file that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },

    /// A condition references a field outside the transaction schema.
    #[error("rule {rule}: condition references undeclared field {field:?}")]
    UndeclaredField {
        /// The offending rule.
        rule: RuleCode,
        /// The unknown field name.
        field: String,
    },

    /// A transaction formula references a symbol other than `base`/`rate`.
    #[error("rule {rule}: transaction formula may only reference base and rate, found {symbol:?}")]
    ForbiddenSymbol {
        /// The offending rule.
        rule: RuleCode,
        /// The out-of-scope symbol.
        symbol: String,
    },

    /// A transaction formula calls an aggregate function.
    #[error("rule {rule}: aggregate functions are not allowed in transaction formulas")]
    FunctionInTransactionFormula {
        /// The offending rule.
        rule: RuleCode,
    },

    /// A formula failed to parse outside the serde path.
    #[error("rule {rule}: {source}")]
    BadFormula {
        /// The offending rule.
        rule: RuleCode,
        /// Underlying formula error.
        source: FormulaError,
    },

    /// A rule's formula reads `rate` but the rule names no rate code.
    #[error("rule {rule}: formula references rate but the rule has no rate_code")]
    MissingRateCode {
        /// The offending rule.
        rule: RuleCode,
    },

    /// A rule's formula reads `base` but the rule has no base_source.
    #[error("rule {rule}: formula references base but the rule has no base_source")]
    MissingBaseSource {
        /// The offending rule.
        rule: RuleCode,
    },

    /// Two rules share one code.
    #[error("duplicate rule code {0}")]
    DuplicateRuleCode(RuleCode),

    /// Two validation rules share one code.
    #[error("duplicate validation rule code {0}")]
    DuplicateValidationCode(RuleCode),

    /// More than one rate for a code is in effect on a date.
    #[error("rate {code}: more than one active rate in effect on {on}")]
    DuplicateActiveRate {
        /// The rate code.
        code: RateCode,
        /// The date on which the overlap was detected.
        on: NaiveDate,
    },

    /// A bucket is mapped to more than one form line.
    #[error("bucket {0} is mapped to more than one form line")]
    DuplicateMapping(BucketName),
}

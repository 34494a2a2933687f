//! # Registry and Snapshot Resolution
//!
//! [`Registry`] owns the full effective-dated record set;
//! [`Registry::snapshot_as_of`] resolves the records in effect on one
//! date into an immutable [`RegistrySnapshot`]. The pipeline pins one
//! snapshot per run and passes it by reference — no step re-queries
//! mutable registry state mid-run, which is what makes `compute`
//! idempotent.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use taxpulse_core::{BucketName, RateCode, RuleScope, TaxType, Transaction};

use crate::error::ConfigError;
use crate::records::{OutputMapping, TaxRate, TaxRule, ValidationRule};

/// The symbols a transaction-scope formula may reference.
const TRANSACTION_SYMBOLS: [&str; 2] = ["base", "rate"];

/// The complete effective-dated rule and rate record set.
///
/// Construction validates every record; a `Registry` in hand means the
/// pack compiled cleanly.
#[derive(Debug, Clone)]
pub struct Registry {
    rates: Vec<TaxRate>,
    rules: Vec<TaxRule>,
    validations: Vec<ValidationRule>,
    mappings: Vec<OutputMapping>,
}

impl Registry {
    /// Build a registry from raw record sets, running all load-time checks.
    pub fn new(
        rates: Vec<TaxRate>,
        rules: Vec<TaxRule>,
        validations: Vec<ValidationRule>,
        mappings: Vec<OutputMapping>,
    ) -> Result<Self, ConfigError> {
        let mut rule_codes = HashSet::new();
        for rule in &rules {
            if !rule_codes.insert(rule.code.clone()) {
                return Err(ConfigError::DuplicateRuleCode(rule.code.clone()));
            }
            check_tax_rule(rule)?;
        }

        let mut validation_codes = HashSet::new();
        for validation in &validations {
            if !validation_codes.insert(validation.code.clone()) {
                return Err(ConfigError::DuplicateValidationCode(validation.code.clone()));
            }
            check_validation_rule(validation)?;
        }

        let mut mapped = HashSet::new();
        for mapping in &mappings {
            if !mapped.insert(mapping.output_bucket.clone()) {
                return Err(ConfigError::DuplicateMapping(mapping.output_bucket.clone()));
            }
        }

        Ok(Self {
            rates,
            rules,
            validations,
            mappings,
        })
    }

    /// Resolve the records in effect on `as_of` into an immutable snapshot.
    ///
    /// Fails if two rates for one code are simultaneously in effect — the
    /// at-most-one-active-rate invariant is enforced here, at the moment
    /// a run would depend on it.
    pub fn snapshot_as_of(&self, as_of: NaiveDate) -> Result<RegistrySnapshot, ConfigError> {
        let mut rates = BTreeMap::new();
        for rate in self.rates.iter().filter(|r| r.in_effect(as_of)) {
            if rates.insert(rate.code.clone(), rate.rate).is_some() {
                return Err(ConfigError::DuplicateActiveRate {
                    code: rate.code.clone(),
                    on: as_of,
                });
            }
        }

        let mut transaction_rules: Vec<TaxRule> = Vec::new();
        let mut aggregate_rules: Vec<TaxRule> = Vec::new();
        for rule in self.rules.iter().filter(|r| r.in_effect(as_of)) {
            match rule.scope {
                RuleScope::Transaction => transaction_rules.push(rule.clone()),
                RuleScope::Aggregate => aggregate_rules.push(rule.clone()),
            }
        }
        sort_rules(&mut transaction_rules);
        sort_rules(&mut aggregate_rules);

        let mut transaction_validations: Vec<ValidationRule> = Vec::new();
        let mut aggregate_validations: Vec<ValidationRule> = Vec::new();
        for validation in self.validations.iter().filter(|v| v.in_effect(as_of)) {
            match validation.scope {
                RuleScope::Transaction => transaction_validations.push(validation.clone()),
                RuleScope::Aggregate => aggregate_validations.push(validation.clone()),
            }
        }
        transaction_validations.sort_by(|a, b| a.code.cmp(&b.code));
        aggregate_validations.sort_by(|a, b| a.code.cmp(&b.code));

        let mappings: BTreeMap<BucketName, OutputMapping> = self
            .mappings
            .iter()
            .map(|m| (m.output_bucket.clone(), m.clone()))
            .collect();

        tracing::debug!(
            %as_of,
            rates = rates.len(),
            transaction_rules = transaction_rules.len(),
            aggregate_rules = aggregate_rules.len(),
            "resolved registry snapshot"
        );

        Ok(RegistrySnapshot {
            as_of,
            rates,
            transaction_rules,
            aggregate_rules,
            transaction_validations,
            aggregate_validations,
            mappings,
        })
    }
}

/// Deterministic rule order: (priority ascending, code ascending).
fn sort_rules(rules: &mut [TaxRule]) {
    rules.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.code.cmp(&b.code))
    });
}

/// Load-time checks for one tax rule.
fn check_tax_rule(rule: &TaxRule) -> Result<(), ConfigError> {
    if rule.scope == RuleScope::Transaction {
        for field in rule.condition.fields() {
            if !Transaction::is_declared_field(field) {
                return Err(ConfigError::UndeclaredField {
                    rule: rule.code.clone(),
                    field: field.to_string(),
                });
            }
        }

        if rule.formula.has_calls() {
            return Err(ConfigError::FunctionInTransactionFormula {
                rule: rule.code.clone(),
            });
        }
        for symbol in rule.formula.refs() {
            if !TRANSACTION_SYMBOLS.contains(&symbol) {
                return Err(ConfigError::ForbiddenSymbol {
                    rule: rule.code.clone(),
                    symbol: symbol.to_string(),
                });
            }
        }
        if rule.formula.refs().contains("rate") && rule.rate_code.is_none() {
            return Err(ConfigError::MissingRateCode {
                rule: rule.code.clone(),
            });
        }
        if rule.formula.refs().contains("base") && rule.base_source.is_none() {
            return Err(ConfigError::MissingBaseSource {
                rule: rule.code.clone(),
            });
        }
        if let Some(base_source) = &rule.base_source {
            if !Transaction::is_declared_field(base_source) {
                return Err(ConfigError::UndeclaredField {
                    rule: rule.code.clone(),
                    field: base_source.clone(),
                });
            }
        }
    }
    // Aggregate rule formulas reference bucket names, which are open
    // vocabulary; their conditions are checked like aggregate validations.
    Ok(())
}

/// Load-time checks for one validation rule.
fn check_validation_rule(rule: &ValidationRule) -> Result<(), ConfigError> {
    if rule.scope == RuleScope::Transaction {
        for field in rule.condition.fields() {
            if !Transaction::is_declared_field(field) {
                return Err(ConfigError::UndeclaredField {
                    rule: rule.code.clone(),
                    field: field.to_string(),
                });
            }
        }
    }
    // Aggregate conditions reference bucket names, the per-bucket
    // `bucket`/`amount` builtins, or `recon_*` verdict fields, all open
    // vocabulary resolved at evaluation time (missing names read as null).
    Ok(())
}

/// The immutable record set one run computes against.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// The date the snapshot was resolved for.
    pub as_of: NaiveDate,
    rates: BTreeMap<RateCode, Decimal>,
    transaction_rules: Vec<TaxRule>,
    aggregate_rules: Vec<TaxRule>,
    transaction_validations: Vec<ValidationRule>,
    aggregate_validations: Vec<ValidationRule>,
    mappings: BTreeMap<BucketName, OutputMapping>,
}

impl RegistrySnapshot {
    /// The active rate for a code, if any.
    pub fn rate(&self, code: &RateCode) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    /// Transaction-scope tax rules for one tax type, in (priority, code) order.
    pub fn transaction_rules_for(&self, tax_type: TaxType) -> impl Iterator<Item = &TaxRule> {
        self.transaction_rules
            .iter()
            .filter(move |r| r.tax_type == tax_type)
    }

    /// Aggregate-scope tax rules for one tax type, in (priority, code) order.
    pub fn aggregate_rules_for(&self, tax_type: TaxType) -> impl Iterator<Item = &TaxRule> {
        self.aggregate_rules
            .iter()
            .filter(move |r| r.tax_type == tax_type)
    }

    /// Transaction-scope validation rules, in code order.
    pub fn transaction_validations(&self) -> &[ValidationRule] {
        &self.transaction_validations
    }

    /// Aggregate-scope validation rules, in code order.
    pub fn aggregate_validations(&self) -> &[ValidationRule] {
        &self.aggregate_validations
    }

    /// The form-line mapping for a bucket, if configured.
    pub fn mapping(&self, bucket: &BucketName) -> Option<&OutputMapping> {
        self.mappings.get(bucket)
    }

    /// All configured mappings, in bucket order.
    pub fn mappings(&self) -> impl Iterator<Item = &OutputMapping> {
        self.mappings.values()
    }
}

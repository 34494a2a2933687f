//! # Condition AST and Evaluator
//!
//! Conditions are externally tagged, so pack YAML reads like a predicate:
//!
//! ```yaml
//! condition:
//!   and:
//!     - eq: { field: tax_type, value: VAT }
//!     - in: { field: type_tax_use, values: [sale] }
//!     - gt: { field: gross_amount, value: 0 }
//! ```
//!
//! ## Null semantics
//!
//! - Field lookup on a missing key yields null, never an error.
//! - `eq` against a null literal is true only when the field is null.
//! - Every ordering comparison against null is false.
//! - Type-mismatched comparisons are false, never an error.
//! - `in` is literal-list membership; mismatches are false.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use taxpulse_core::{FieldContext, FieldValue};

/// A literal value appearing in a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// The null literal — matches absent fields under `eq`.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(Decimal),
    /// Text literal, including ISO-8601 dates.
    Text(String),
}

impl Serialize for LiteralValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => {
                use rust_decimal::prelude::ToPrimitive;
                // Emit numbers as numbers so round-tripped packs stay readable.
                if n.fract().is_zero() {
                    if let Some(i) = n.to_i64() {
                        return serializer.serialize_i64(i);
                    }
                }
                match n.to_f64() {
                    Some(f) => serializer.serialize_f64(f),
                    None => serializer.serialize_str(&n.to_string()),
                }
            }
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for LiteralValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LiteralVisitor;

        impl<'de> Visitor<'de> for LiteralVisitor {
            type Value = LiteralValue;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("null, bool, number, or string")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(LiteralValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(LiteralValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(LiteralValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(LiteralValue::Number(Decimal::from(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(LiteralValue::Number(Decimal::from(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Decimal::try_from(v)
                    .map(LiteralValue::Number)
                    .map_err(|e| de::Error::custom(format!("non-decimal number {v}: {e}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(LiteralValue::Text(v.to_string()))
            }
        }

        deserializer.deserialize_any(LiteralVisitor)
    }
}

/// A field/literal pair for the comparison operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Comparison {
    /// Field name resolved against the evaluation context.
    pub field: String,
    /// Literal to compare against.
    pub value: LiteralValue,
}

/// A field/list pair for the membership operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Membership {
    /// Field name resolved against the evaluation context.
    pub field: String,
    /// Literal list to test membership in.
    pub values: Vec<LiteralValue>,
}

/// A rule condition: a closed boolean/comparison expression tree.
///
/// Deserialization is the arity and operator check — any operator outside
/// this enum, or an operand shape that does not match, is rejected before
/// a rule can be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Always true — the unconditional rule trigger.
    Always,
    /// Logical conjunction over sub-conditions.
    And(Vec<Condition>),
    /// Logical disjunction over sub-conditions.
    Or(Vec<Condition>),
    /// Logical negation.
    Not(Box<Condition>),
    /// `field == value`.
    Eq(Comparison),
    /// `field != value`.
    Ne(Comparison),
    /// `field < value`.
    Lt(Comparison),
    /// `field <= value`.
    Le(Comparison),
    /// `field > value`.
    Gt(Comparison),
    /// `field >= value`.
    Ge(Comparison),
    /// `field in values`.
    In(Membership),
}

impl Condition {
    /// Evaluate the condition against a field context.
    ///
    /// Total: terminates and never errors for any AST this type can
    /// represent.
    pub fn evaluate(&self, ctx: &dyn FieldContext) -> bool {
        match self {
            Self::Always => true,
            Self::And(subs) => subs.iter().all(|c| c.evaluate(ctx)),
            Self::Or(subs) => subs.iter().any(|c| c.evaluate(ctx)),
            Self::Not(sub) => !sub.evaluate(ctx),
            Self::Eq(cmp) => values_equal(&ctx.field(&cmp.field), &cmp.value),
            Self::Ne(cmp) => !values_equal(&ctx.field(&cmp.field), &cmp.value),
            Self::Lt(cmp) => ordering_is(ctx, cmp, |o| o == Ordering::Less),
            Self::Le(cmp) => ordering_is(ctx, cmp, |o| o != Ordering::Greater),
            Self::Gt(cmp) => ordering_is(ctx, cmp, |o| o == Ordering::Greater),
            Self::Ge(cmp) => ordering_is(ctx, cmp, |o| o != Ordering::Less),
            Self::In(m) => {
                let actual = ctx.field(&m.field);
                m.values.iter().any(|v| values_equal(&actual, v))
            }
        }
    }

    /// Every field name this condition references.
    ///
    /// The pack loader checks these against the declared schema of the
    /// rule's scope.
    pub fn fields(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Self::Always => {}
            Self::And(subs) | Self::Or(subs) => {
                for sub in subs {
                    sub.collect_fields(out);
                }
            }
            Self::Not(sub) => sub.collect_fields(out),
            Self::Eq(c) | Self::Ne(c) | Self::Lt(c) | Self::Le(c) | Self::Gt(c) | Self::Ge(c) => {
                out.insert(&c.field);
            }
            Self::In(m) => {
                out.insert(&m.field);
            }
        }
    }
}

/// Equality across the value/literal domains. Mismatched types are
/// unequal, never an error.
fn values_equal(actual: &FieldValue, literal: &LiteralValue) -> bool {
    match (actual, literal) {
        (FieldValue::Null, LiteralValue::Null) => true,
        (FieldValue::Bool(a), LiteralValue::Bool(b)) => a == b,
        (FieldValue::Number(a), LiteralValue::Number(b)) => a == b,
        (FieldValue::Text(a), LiteralValue::Text(b)) => a == b,
        _ => false,
    }
}

/// Ordering across the value/literal domains. Null or mismatched types
/// order as `None`, which every ordering operator treats as false.
fn value_ordering(actual: &FieldValue, literal: &LiteralValue) -> Option<Ordering> {
    match (actual, literal) {
        (FieldValue::Number(a), LiteralValue::Number(b)) => Some(a.cmp(b)),
        // ISO-8601 dates surface as text, so lexicographic text ordering
        // doubles as chronological ordering.
        (FieldValue::Text(a), LiteralValue::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

fn ordering_is(ctx: &dyn FieldContext, cmp: &Comparison, pred: impl Fn(Ordering) -> bool) -> bool {
    value_ordering(&ctx.field(&cmp.field), &cmp.value).is_some_and(pred)
}

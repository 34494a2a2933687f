//! # Field Values — the Condition Evaluator's View of Data
//!
//! Rule conditions never see structs; they see a flat map of named fields.
//! `FieldValue` is the closed value domain of that map and
//! [`FieldContext`] is the seam both transactions and aggregate bucket
//! states implement.
//!
//! Dates are deliberately absent from the value domain: date-valued
//! fields surface as ISO-8601 text, so lexicographic text comparison is
//! chronological comparison.

use rust_decimal::Decimal;

/// A single field value as seen by the condition evaluator.
///
/// Lookup of a missing field yields `Null`, never an error — the
/// evaluator is total over well-formed ASTs. This is a runtime-only
/// type; it never appears in serialized records.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent or explicitly null field.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric amount or rate.
    Number(Decimal),
    /// Text, including ISO-8601 dates and code values.
    Text(String),
}

impl FieldValue {
    /// Convert a JSON value into a field value.
    ///
    /// Numbers that exceed `Decimal` range degrade to `Null` rather than
    /// erroring; such magnitudes are outside any plausible ledger amount.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                let text = n.to_string();
                text.parse::<Decimal>()
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(Self::Number)
                    .unwrap_or(Self::Null)
            }
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Null,
        }
    }

    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// The seam between data records and the condition evaluator.
///
/// Implemented by `Transaction` and by the aggregate bucket context; the
/// evaluator works against this trait only and performs no side effects.
pub trait FieldContext {
    /// Look up a field by name. Missing fields yield `FieldValue::Null`.
    fn field(&self, name: &str) -> FieldValue;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_json_scalars() {
        use serde_json::json;
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from_json(&json!(true)), FieldValue::Bool(true));
        assert_eq!(
            FieldValue::from_json(&json!(350000.5)),
            FieldValue::Number(dec!(350000.5))
        );
        assert_eq!(
            FieldValue::from_json(&json!("W010")),
            FieldValue::Text("W010".to_string())
        );
    }

    #[test]
    fn test_from_json_composites_are_null() {
        use serde_json::json;
        assert!(FieldValue::from_json(&json!([1, 2])).is_null());
        assert!(FieldValue::from_json(&json!({"a": 1})).is_null());
    }

    #[test]
    fn test_option_conversion() {
        let absent: Option<&str> = None;
        assert_eq!(FieldValue::from(absent), FieldValue::Null);
        assert_eq!(
            FieldValue::from(Some("sale")),
            FieldValue::Text("sale".to_string())
        );
    }
}

//! Violations and message templating.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use taxpulse_core::{FieldContext, FieldValue, RuleCode, RuleScope, Severity};

/// One validation finding on a return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The validation rule (or diagnostic category) that fired.
    pub rule_code: RuleCode,
    /// Error blocks review; warning requires acknowledgment.
    pub level: Severity,
    /// Which pass produced the finding.
    pub scope: RuleScope,
    /// Rendered, human-readable message.
    pub message: String,
    /// The field values the finding was based on, for audit display.
    pub context: BTreeMap<String, String>,
}

/// All findings from one validation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Findings in the order the passes produced them.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Error-level findings.
    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.level == Severity::Error)
    }

    /// Warning-level findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.level == Severity::Warning)
    }

    /// Whether any finding blocks submission for review.
    pub fn has_blocking(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Render a `%{field}` message template against a field context.
///
/// Unknown fields render empty; a `%` not followed by `{` and an
/// unterminated placeholder pass through verbatim. Templates are pack
/// data, so rendering must be total.
pub fn render_template(template: &str, ctx: &dyn FieldContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&render_value(ctx.field(&after[..end])));
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// One field value as message text.
pub fn render_value(value: FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Text(t) => t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct MapCtx(BTreeMap<String, FieldValue>);

    impl FieldContext for MapCtx {
        fn field(&self, name: &str) -> FieldValue {
            self.0.get(name).cloned().unwrap_or(FieldValue::Null)
        }
    }

    fn ctx() -> MapCtx {
        let mut map = BTreeMap::new();
        map.insert("txn_id".to_string(), FieldValue::Text("INV-1".into()));
        map.insert("gross_amount".to_string(), FieldValue::Number(dec!(-500.00)));
        MapCtx(map)
    }

    #[test]
    fn test_placeholders_substitute() {
        let msg = render_template("Transaction %{txn_id} has gross %{gross_amount}", &ctx());
        assert_eq!(msg, "Transaction INV-1 has gross -500.00");
    }

    #[test]
    fn test_unknown_field_renders_empty() {
        assert_eq!(render_template("x=%{nope}!", &ctx()), "x=!");
    }

    #[test]
    fn test_unterminated_placeholder_passes_through() {
        assert_eq!(render_template("oops %{txn_id", &ctx()), "oops %{txn_id");
    }

    #[test]
    fn test_bare_percent_passes_through() {
        assert_eq!(render_template("100% done", &ctx()), "100% done");
    }
}

//! Serializable view of the rule table for `kcfg schema`.

use kcfg_resolver::{Category, Constraint, OptionValue, Rule, RuleTable, Source, ValueKind};
use serde::Serialize;

/// One rule as listed by the schema command.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaEntry {
    pub key: String,
    pub category: Category,
    pub kind: ValueKind,
    /// `default`, `derived` or `derived-default`
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<OptionValue>,
    pub constraint: Constraint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation: Option<DerivationEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub define: Option<&'static str>,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DerivationEntry {
    pub inputs: Vec<String>,
    pub expr: &'static str,
}

impl SchemaEntry {
    pub fn from_rule(rule: &Rule) -> Self {
        let source = match rule.source() {
            Source::Default(_) => "default",
            Source::Derived(_) => "derived",
            Source::DerivedDefault(_) => "derived-default",
        };
        Self {
            key: rule.key().to_string(),
            category: rule.category(),
            kind: rule.kind(),
            source,
            default: rule.default_value().cloned(),
            constraint: rule.get_constraint(),
            derivation: rule.derivation().map(|d| DerivationEntry {
                inputs: d.inputs().iter().map(|k| k.to_string()).collect(),
                expr: d.expr(),
            }),
            define: rule.define_name(),
            description: rule.description(),
        }
    }
}

/// Every rule in declaration order.
pub fn entries(rules: &RuleTable) -> Vec<SchemaEntry> {
    rules.iter().map(SchemaEntry::from_rule).collect()
}

//! Resolved values as C preprocessor defines.

use kcfg_resolver::{Category, OptionValue, ResolvedConfig, Rule, RuleTable};

use crate::kernel::TrustZoneMode;

/// Keys whose zero value means "leave it to the port" and is not emitted.
const UNSET_WHEN_ZERO: &[&str] = &["cpu_clock_hz"];

/// One `#define NAME VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: &'static str,
    pub value: String,
    pub category: Category,
}

impl Define {
    /// Compiler flag form, e.g. `-DconfigTICK_RATE_HZ=1000`.
    pub fn to_flag(&self) -> String {
        format!("-D{}={}", self.name, self.value)
    }
}

/// Every emitted define, in rule declaration order.
///
/// Keys without a macro name and unset zero values are skipped.
pub fn defines(resolved: &ResolvedConfig, rules: &RuleTable) -> Vec<Define> {
    let mut out = Vec::new();
    for rule in rules.iter() {
        let Some(name) = rule.define_name() else {
            continue;
        };
        let Some(value) = resolved.get(rule.key().as_str()) else {
            log::warn!("'{}' has no resolved value; {} not emitted", rule.key(), name);
            continue;
        };
        if let Some(value) = render_value(rule, value) {
            out.push(Define {
                name,
                value,
                category: rule.category(),
            });
        }
    }
    out
}

fn is_priority(rule: &Rule) -> bool {
    rule.category() == Category::Interrupt && rule.key().as_str().ends_with("_priority")
}

fn render_value(rule: &Rule, value: &OptionValue) -> Option<String> {
    match value {
        OptionValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        OptionValue::UInt(0) if UNSET_WHEN_ZERO.contains(&rule.key().as_str()) => None,
        OptionValue::UInt(n) if is_priority(rule) => Some(format!("0x{:02X}", n)),
        OptionValue::UInt(n) => Some(n.to_string()),
        OptionValue::Choice(choice) => render_choice(rule, choice),
    }
}

fn render_choice(rule: &Rule, choice: &str) -> Option<String> {
    match rule.key().as_str() {
        // configRUN_FREERTOS_SECURE_ONLY
        "trustzone_mode" => {
            let mode: TrustZoneMode = choice.parse().ok()?;
            Some(if mode.runs_secure_only() { "1" } else { "0" }.to_string())
        }
        _ => Some(format!("\"{}\"", choice)),
    }
}

//! Typed option values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    UInt(u64),
    /// One member of a small enumerated set, e.g. `secure-only`.
    Choice(String),
}

impl OptionValue {
    pub fn choice(name: impl Into<String>) -> Self {
        OptionValue::Choice(name.into())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            OptionValue::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            OptionValue::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::UInt(_) => "unsigned integer",
            OptionValue::Choice(_) => "choice",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::UInt(n) => write!(f, "{}", n),
            OptionValue::Choice(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<u64> for OptionValue {
    fn from(n: u64) -> Self {
        OptionValue::UInt(n)
    }
}

/// The declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "choices", rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    UInt,
    Choice(&'static [&'static str]),
}

impl ValueKind {
    /// Whether `value` is of this kind. Choices must name a declared member.
    pub fn admits(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (ValueKind::Bool, OptionValue::Bool(_)) => true,
            (ValueKind::UInt, OptionValue::UInt(_)) => true,
            (ValueKind::Choice(choices), OptionValue::Choice(s)) => choices.contains(&s.as_str()),
            _ => false,
        }
    }

    /// Human-readable description used as the violated constraint.
    pub fn describe(&self) -> String {
        match self {
            ValueKind::Bool => "must be a boolean".to_string(),
            ValueKind::UInt => "must be an unsigned integer".to_string(),
            ValueKind::Choice(choices) => format!("must be one of {}", choices.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: &[&str] = &["secure-only", "non-secure-only"];

    #[test]
    fn test_kind_admits() {
        assert!(ValueKind::Bool.admits(&OptionValue::Bool(true)));
        assert!(!ValueKind::Bool.admits(&OptionValue::UInt(1)));
        assert!(ValueKind::UInt.admits(&OptionValue::UInt(0)));
        assert!(ValueKind::Choice(MODES).admits(&OptionValue::choice("secure-only")));
        assert!(!ValueKind::Choice(MODES).admits(&OptionValue::choice("both")));
    }

    #[test]
    fn test_untagged_serialization() {
        assert_eq!(serde_json::to_string(&OptionValue::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&OptionValue::UInt(224)).unwrap(), "224");
        assert_eq!(
            serde_json::to_string(&OptionValue::choice("secure-only")).unwrap(),
            "\"secure-only\""
        );
        let parsed: OptionValue = serde_json::from_str("1000").unwrap();
        assert_eq!(parsed, OptionValue::UInt(1000));
    }

    #[test]
    fn test_describe_choice() {
        assert_eq!(
            ValueKind::Choice(MODES).describe(),
            "must be one of secure-only, non-secure-only"
        );
    }
}

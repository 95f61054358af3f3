//! The complete configuration produced by a successful resolution.

use crate::key::OptionKey;
use crate::value::OptionValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Supplied by the target.
    User,
    /// Taken from the rule table default.
    Default,
    /// Computed by a derivation.
    Derived,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::User => "user",
            Origin::Default => "default",
            Origin::Derived => "derived",
        }
    }
}

/// A resolved value with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub value: OptionValue,
    pub origin: Origin,
}

/// Total, validated configuration covering every key of a rule table.
///
/// There is no mutating API; a `ResolvedConfig` is only produced by
/// [`crate::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedConfig {
    entries: BTreeMap<OptionKey, ResolvedEntry>,
}

impl ResolvedConfig {
    pub(crate) fn from_entries(entries: BTreeMap<OptionKey, ResolvedEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn entry(&self, key: &str) -> Option<&ResolvedEntry> {
        self.entries.get(key)
    }

    pub fn origin(&self, key: &str) -> Option<Origin> {
        self.entries.get(key).map(|e| e.origin)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.as_u64())
    }

    pub fn get_choice(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_choice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &OptionKey> {
        self.entries.keys()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &ResolvedEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResolvedConfig {
        let mut entries = BTreeMap::new();
        entries.insert(
            OptionKey::new("kernel_interrupt_priority"),
            ResolvedEntry {
                value: OptionValue::UInt(224),
                origin: Origin::Derived,
            },
        );
        entries.insert(
            OptionKey::new("use_mutexes"),
            ResolvedEntry {
                value: OptionValue::Bool(true),
                origin: Origin::User,
            },
        );
        ResolvedConfig::from_entries(entries)
    }

    #[test]
    fn test_typed_getters() {
        let config = sample();
        assert_eq!(config.get_u64("kernel_interrupt_priority"), Some(224));
        assert_eq!(config.get_bool("use_mutexes"), Some(true));
        assert_eq!(config.get_bool("kernel_interrupt_priority"), None);
        assert_eq!(config.origin("kernel_interrupt_priority"), Some(Origin::Derived));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["kernel_interrupt_priority"]["value"], 224);
        assert_eq!(json["use_mutexes"]["origin"], "user");
    }
}

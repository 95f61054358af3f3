//! Option keys and the categories that namespace them.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Category an option key belongs to.
///
/// Board files group keys by category (`[scheduler]`, `[memory]`, ...), and
/// the rule table records which category owns each key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Scheduler behaviour: preemption, tick rate, priorities.
    Scheduler,
    /// Memory sizing: stacks, heap, allocation schemes.
    Memory,
    /// Interrupt priority configuration.
    Interrupt,
    /// Optional kernel subsystems and API inclusion switches.
    Feature,
    /// Diagnostic and statistics toggles.
    Diagnostic,
    /// Security-state configuration for TrustZone capable cores.
    TrustZone,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 6] = [
        Category::Scheduler,
        Category::Memory,
        Category::Interrupt,
        Category::Feature,
        Category::Diagnostic,
        Category::TrustZone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Scheduler => "scheduler",
            Category::Memory => "memory",
            Category::Interrupt => "interrupt",
            Category::Feature => "feature",
            Category::Diagnostic => "diagnostic",
            Category::TrustZone => "trustzone",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static key pattern"))
}

/// Symbolic identifier of a configuration option, e.g. `tick_rate_hz`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionKey(String);

impl OptionKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is a lowercase snake-case identifier.
    pub fn is_well_formed(&self) -> bool {
        key_pattern().is_match(&self.0)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OptionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OptionKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for OptionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("kernel".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::TrustZone).unwrap();
        assert_eq!(json, "\"trustzone\"");
    }

    #[test]
    fn test_key_well_formed() {
        assert!(OptionKey::new("tick_rate_hz").is_well_formed());
        assert!(OptionKey::new("use_16_bit_ticks").is_well_formed());
        assert!(!OptionKey::new("configTICK_RATE_HZ").is_well_formed());
        assert!(!OptionKey::new("9lives").is_well_formed());
        assert!(!OptionKey::new("").is_well_formed());
    }

    #[test]
    fn test_key_borrows_as_str() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(OptionKey::new("prio_bits"), 3u64);
        assert_eq!(map.get("prio_bits"), Some(&3));
    }
}

//! Sparse, user-authored configuration for one build target.

use crate::key::OptionKey;
use crate::value::OptionValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Settings one target supplies. Keys left out fall back to the rule table.
///
/// Built once through the consuming `with_*` methods or `FromIterator` and
/// read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUserConfig {
    #[serde(default)]
    values: BTreeMap<OptionKey, OptionValue>,

    /// Hook functions the target implements, e.g. `suppress_ticks_and_sleep`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    hooks: BTreeSet<String>,
}

impl RawUserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. A later call for the same key replaces the earlier one.
    pub fn with(mut self, key: impl Into<OptionKey>, value: impl Into<OptionValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_hook(mut self, name: impl Into<String>) -> Self {
        self.hooks.insert(name.into());
        self
    }

    pub fn with_hooks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hooks.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &OptionValue)> {
        self.values.iter()
    }

    pub fn hooks(&self) -> &BTreeSet<String> {
        &self.hooks
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawUserConfig
where
    K: Into<OptionKey>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            hooks: BTreeSet::new(),
        }
    }
}

//! Resolution error taxonomy.

use serde::Serialize;

/// Errors raised while building a rule table or resolving a target.
///
/// `Dependency` and `Invariant` point at defects in the rule table itself;
/// `Validation`, `Consistency` and `Derivation` are specific to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigError {
    /// A single key holds an invalid value.
    #[error("invalid value {value} for '{key}': {constraint}")]
    Validation {
        key: String,
        value: String,
        constraint: String,
    },

    /// Cyclic or dangling derivation reference.
    #[error("dependency error at '{key}': {detail}")]
    Dependency { key: String, detail: String },

    /// The rule table or resolver broke one of its own guarantees.
    #[error("internal invariant violated: {detail}")]
    Invariant { detail: String },

    /// A cross-field rule does not hold.
    #[error("inconsistent configuration ({rule}) involving {}: {message}", keys.join(", "))]
    Consistency {
        rule: String,
        keys: Vec<String>,
        message: String,
    },

    /// Arithmetic fault while computing a derived key.
    #[error("cannot derive '{key}': {detail}")]
    Derivation { key: String, detail: String },
}

impl ConfigError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Validation { .. } => "VALIDATION",
            ConfigError::Dependency { .. } => "DEPENDENCY",
            ConfigError::Invariant { .. } => "INVARIANT",
            ConfigError::Consistency { .. } => "CONSISTENCY",
            ConfigError::Derivation { .. } => "DERIVATION",
        }
    }

    /// Whether the error is a rule-table defect that breaks every target,
    /// as opposed to a problem with one target's settings.
    pub fn is_schema_defect(&self) -> bool {
        matches!(
            self,
            ConfigError::Dependency { .. } | ConfigError::Invariant { .. }
        )
    }

    /// Keys the error refers to.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            ConfigError::Validation { key, .. }
            | ConfigError::Dependency { key, .. }
            | ConfigError::Derivation { key, .. } => vec![key.as_str()],
            ConfigError::Consistency { keys, .. } => keys.iter().map(|k| k.as_str()).collect(),
            ConfigError::Invariant { .. } => Vec::new(),
        }
    }

    pub(crate) fn validation(key: impl Into<String>, value: impl ToString, constraint: impl Into<String>) -> Self {
        ConfigError::Validation {
            key: key.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    pub(crate) fn invariant(detail: impl Into<String>) -> Self {
        ConfigError::Invariant {
            detail: detail.into(),
        }
    }

    pub(crate) fn dependency(key: impl Into<String>, detail: impl Into<String>) -> Self {
        ConfigError::Dependency {
            key: key.into(),
            detail: detail.into(),
        }
    }
}

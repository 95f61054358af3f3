//! Rule definitions: per-key defaults, constraints, derivations, and
//! cross-field invariants.

use crate::key::{Category, OptionKey};
use crate::resolved::ResolvedEntry;
use crate::value::{OptionValue, ValueKind};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Validity predicate over a single key's value.
///
/// Numeric constraints apply to unsigned integer keys only; the kind check
/// covers booleans and choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    Any,
    /// Inclusive range `[min, max]`.
    Range { min: u64, max: u64 },
    /// Half-open range `[0, limit)`.
    Below { limit: u64 },
    AtLeast { min: u64 },
    OneOf { values: &'static [u64] },
}

impl Constraint {
    pub fn check(&self, value: &OptionValue) -> bool {
        let n = match (self, value) {
            (Constraint::Any, _) => return true,
            (_, OptionValue::UInt(n)) => *n,
            _ => return false,
        };
        match self {
            Constraint::Any => true,
            Constraint::Range { min, max } => (*min..=*max).contains(&n),
            Constraint::Below { limit } => n < *limit,
            Constraint::AtLeast { min } => n >= *min,
            Constraint::OneOf { values } => values.contains(&n),
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Constraint::Any)
    }

    pub fn describe(&self) -> String {
        match self {
            Constraint::Any => "any value".to_string(),
            Constraint::Range { min, max } => format!("must be in [{}, {}]", min, max),
            Constraint::Below { limit } => format!("must be in [0, {})", limit),
            Constraint::AtLeast { min } => format!("must be at least {}", min),
            Constraint::OneOf { values } => {
                let list: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("must be one of {{{}}}", list.join(", "))
            }
        }
    }
}

/// Failure raised while reading inputs or computing a derived value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeriveError {
    /// Arithmetic fault such as a shift out of range.
    #[error("{0}")]
    Arithmetic(String),

    /// The derivation read a key it did not declare as an input.
    #[error("'{0}' is not a declared input")]
    Undeclared(String),

    /// A declared input has no value yet.
    #[error("'{0}' has no resolved value")]
    Unresolved(String),

    /// A declared input holds a value of the wrong kind.
    #[error("'{key}' is not a {expected}")]
    WrongKind { key: String, expected: &'static str },
}

/// Signature of a derivation function.
pub type DeriveFn = fn(&Lookup<'_>) -> Result<OptionValue, DeriveError>;

/// Signature of a cross-field invariant check.
pub type CheckFn = fn(&Lookup<'_>) -> Result<(), Violation>;

/// Computes a key from other, already resolved keys.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub(crate) inputs: Vec<OptionKey>,
    pub(crate) compute: DeriveFn,
    pub(crate) expr: &'static str,
}

impl Derivation {
    /// `expr` is a human-readable rendering of the computation, shown by
    /// `explain` and in the schema listing.
    pub fn new(inputs: &[&str], expr: &'static str, compute: DeriveFn) -> Self {
        Self {
            inputs: inputs.iter().map(|k| OptionKey::new(*k)).collect(),
            compute,
            expr,
        }
    }

    pub fn inputs(&self) -> &[OptionKey] {
        &self.inputs
    }

    pub fn expr(&self) -> &'static str {
        self.expr
    }
}

/// Where a key's value comes from when the user does not supply one.
#[derive(Debug, Clone)]
pub enum Source {
    /// A fixed default; the user may override it.
    Default(OptionValue),
    /// Always computed. Supplying a value is rejected.
    Derived(Derivation),
    /// Computed unless the user supplies a value.
    DerivedDefault(Derivation),
}

/// One row of the rule table.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) key: OptionKey,
    pub(crate) category: Category,
    pub(crate) kind: ValueKind,
    pub(crate) source: Source,
    pub(crate) constraint: Constraint,
    pub(crate) define: Option<&'static str>,
    pub(crate) doc: &'static str,
}

impl Rule {
    fn with_source(key: &str, category: Category, kind: ValueKind, source: Source) -> Self {
        Self {
            key: OptionKey::new(key),
            category,
            kind,
            source,
            constraint: Constraint::Any,
            define: None,
            doc: "",
        }
    }

    /// Boolean toggle with an explicit default.
    pub fn flag(key: &str, category: Category, default: bool) -> Self {
        Self::with_source(key, category, ValueKind::Bool, Source::Default(default.into()))
    }

    /// Unsigned integer with a default.
    pub fn uint(key: &str, category: Category, default: u64) -> Self {
        Self::with_source(key, category, ValueKind::UInt, Source::Default(default.into()))
    }

    /// Enumerated option; `default` should be one of `choices`.
    pub fn choice(
        key: &str,
        category: Category,
        choices: &'static [&'static str],
        default: &str,
    ) -> Self {
        Self::with_source(
            key,
            category,
            ValueKind::Choice(choices),
            Source::Default(OptionValue::choice(default)),
        )
    }

    /// Derived-only key.
    pub fn derived(key: &str, category: Category, kind: ValueKind, derivation: Derivation) -> Self {
        Self::with_source(key, category, kind, Source::Derived(derivation))
    }

    /// Key computed from others unless the user sets it.
    pub fn derived_default(
        key: &str,
        category: Category,
        kind: ValueKind,
        derivation: Derivation,
    ) -> Self {
        Self::with_source(key, category, kind, Source::DerivedDefault(derivation))
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// C macro this key is emitted as.
    pub fn define(mut self, name: &'static str) -> Self {
        self.define = Some(name);
        self
    }

    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    pub fn key(&self) -> &OptionKey {
        &self.key
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn get_constraint(&self) -> Constraint {
        self.constraint
    }

    pub fn define_name(&self) -> Option<&'static str> {
        self.define
    }

    pub fn description(&self) -> &'static str {
        self.doc
    }

    /// The fixed default, if this key has one.
    pub fn default_value(&self) -> Option<&OptionValue> {
        match &self.source {
            Source::Default(v) => Some(v),
            _ => None,
        }
    }

    pub fn derivation(&self) -> Option<&Derivation> {
        match &self.source {
            Source::Derived(d) | Source::DerivedDefault(d) => Some(d),
            Source::Default(_) => None,
        }
    }

    pub fn is_derived_only(&self) -> bool {
        matches!(self.source, Source::Derived(_))
    }

    /// Whether a value must satisfy both the kind and the constraint.
    pub fn admits(&self, value: &OptionValue) -> bool {
        self.kind.admits(value) && self.constraint.check(value)
    }
}

/// Outcome of a failing invariant check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The invariant does not hold; the message says why.
    Violated(String),
    /// The check could not read one of its keys.
    Lookup(DeriveError),
}

impl From<DeriveError> for Violation {
    fn from(e: DeriveError) -> Self {
        Violation::Lookup(e)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Violated(msg) => f.write_str(msg),
            Violation::Lookup(e) => write!(f, "{}", e),
        }
    }
}

/// Multi-key rule checked after all values are resolved.
#[derive(Debug, Clone)]
pub struct Invariant {
    pub(crate) name: &'static str,
    pub(crate) keys: Vec<OptionKey>,
    pub(crate) check: CheckFn,
}

impl Invariant {
    /// `keys` lists every key the check reads; it is also the set of keys
    /// a violation names.
    pub fn new(name: &'static str, keys: &[&str], check: CheckFn) -> Self {
        Self {
            name,
            keys: keys.iter().map(|k| OptionKey::new(*k)).collect(),
            check,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn keys(&self) -> &[OptionKey] {
        &self.keys
    }
}

/// Read access to resolved values, limited to a declared set of keys.
pub struct Lookup<'a> {
    values: &'a BTreeMap<OptionKey, ResolvedEntry>,
    allowed: &'a [OptionKey],
    hooks: &'a BTreeSet<String>,
}

impl<'a> Lookup<'a> {
    pub(crate) fn new(
        values: &'a BTreeMap<OptionKey, ResolvedEntry>,
        allowed: &'a [OptionKey],
        hooks: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            values,
            allowed,
            hooks,
        }
    }

    pub fn value(&self, key: &str) -> Result<&'a OptionValue, DeriveError> {
        if !self.allowed.iter().any(|k| k.as_str() == key) {
            return Err(DeriveError::Undeclared(key.to_string()));
        }
        self.values
            .get(key)
            .map(|entry| &entry.value)
            .ok_or_else(|| DeriveError::Unresolved(key.to_string()))
    }

    pub fn bool(&self, key: &str) -> Result<bool, DeriveError> {
        self.value(key)?.as_bool().ok_or(DeriveError::WrongKind {
            key: key.to_string(),
            expected: "bool",
        })
    }

    pub fn u64(&self, key: &str) -> Result<u64, DeriveError> {
        self.value(key)?.as_u64().ok_or(DeriveError::WrongKind {
            key: key.to_string(),
            expected: "unsigned integer",
        })
    }

    pub fn choice(&self, key: &str) -> Result<&'a str, DeriveError> {
        self.value(key)?.as_choice().ok_or(DeriveError::WrongKind {
            key: key.to_string(),
            expected: "choice",
        })
    }

    /// Whether the target supplies the named hook function.
    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.contains(name)
    }
}

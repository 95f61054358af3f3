//! Rule-table driven configuration resolver.
//!
//! A target supplies a sparse [`RawUserConfig`]. [`resolve`] fills in
//! defaults from a [`RuleTable`], validates every value, computes derived
//! keys in dependency order and checks cross-field invariants, producing a
//! total [`ResolvedConfig`] or the first [`ConfigError`] it meets.

mod error;
mod key;
mod raw;
mod resolve;
mod resolved;
mod rule;
mod table;
mod value;

pub use error::ConfigError;
pub use key::{Category, OptionKey};
pub use raw::RawUserConfig;
pub use resolve::resolve;
pub use resolved::{Origin, ResolvedConfig, ResolvedEntry};
pub use rule::{
    CheckFn, Constraint, DeriveError, DeriveFn, Derivation, Invariant, Lookup, Rule, Source,
    Violation,
};
pub use table::{RuleTable, RuleTableBuilder};
pub use value::{OptionValue, ValueKind};

//! kcfg - FreeRTOS kernel configuration resolver
//!
//! This crate turns sparse per-board kernel settings into a complete,
//! validated configuration: board files and their includes are merged,
//! resolved against the kernel rule table, and rendered as a C header or
//! a list of compiler defines.

pub mod board;
pub mod emit;
pub mod kernel;
pub mod logger;
pub mod report;

pub use board::{BoardConfig, BoardError, BoardLoader, ConfigSource, SourceOrigin};
pub use kcfg_resolver::{
    resolve, Category, ConfigError, Constraint, OptionKey, OptionValue, Origin, RawUserConfig,
    ResolvedConfig, Rule, RuleTable, ValueKind,
};
pub use report::ResolutionReport;

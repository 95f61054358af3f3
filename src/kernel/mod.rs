//! The FreeRTOS kernel schema: option rules, cross-field invariants, and
//! Cargo feature mapping.

pub mod features;
mod invariants;
mod rules;
pub mod schema;
mod trustzone;

pub use invariants::{HOOK_FLAGS, RUN_TIME_STATS_HOOKS, TICKLESS_HOOK};
pub use rules::{shift_priority, HEAP_SCHEMES};
pub use trustzone::{TrustZoneMode, MODE_NAMES};

use kcfg_resolver::{ConfigError, RawUserConfig, ResolvedConfig, RuleTable};
use std::sync::OnceLock;

/// Schema version, bumped whenever keys or defaults change.
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier.
pub const SCHEMA_ID: &str = "kcfg/freertos-rules@1";

/// Build a fresh copy of the kernel rule table.
pub fn build_rules() -> Result<RuleTable, ConfigError> {
    RuleTable::builder()
        .rules(rules::all())
        .invariants(invariants::all())
        .build()
}

/// The process-wide kernel rule table, built on first use.
pub fn rules() -> Result<&'static RuleTable, ConfigError> {
    static TABLE: OnceLock<Result<RuleTable, ConfigError>> = OnceLock::new();
    TABLE.get_or_init(build_rules).as_ref().map_err(Clone::clone)
}

/// Resolve a target against the kernel rule table.
pub fn resolve(raw: &RawUserConfig) -> Result<ResolvedConfig, ConfigError> {
    kcfg_resolver::resolve(raw, rules()?)
}

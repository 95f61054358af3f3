//! The resolution passes: known keys, seed, validate, derive, completeness,
//! consistency.

use crate::error::ConfigError;
use crate::key::OptionKey;
use crate::raw::RawUserConfig;
use crate::resolved::{Origin, ResolvedConfig, ResolvedEntry};
use crate::rule::{DeriveError, Lookup, Rule, Source, Violation};
use crate::table::RuleTable;
use std::collections::BTreeMap;

type Values = BTreeMap<OptionKey, ResolvedEntry>;

/// Resolve one target's sparse settings against a rule table.
///
/// Returns the first error found, scanning keys in the table's declaration
/// order. Nothing is returned on failure; resolution is all-or-nothing.
pub fn resolve(raw: &RawUserConfig, rules: &RuleTable) -> Result<ResolvedConfig, ConfigError> {
    log::debug!("resolving {} user values against {} rules", raw.len(), rules.len());

    match run_passes(raw, rules) {
        Ok(values) => {
            log::info!("resolved {} keys ({} user-supplied)", values.len(), raw.len());
            Ok(ResolvedConfig::from_entries(values))
        }
        Err(e) => {
            log::warn!("resolution failed [{}]: {}", e.code(), e);
            Err(e)
        }
    }
}

fn run_passes(raw: &RawUserConfig, rules: &RuleTable) -> Result<Values, ConfigError> {
    check_known(raw, rules)?;
    let mut values = seed(raw, rules);
    validate(&values, raw, rules)?;
    derive(&mut values, raw, rules)?;
    check_complete(&values, rules)?;
    check_consistency(&values, raw, rules)?;
    Ok(values)
}

/// Keys the table does not declare have no place in the declaration order,
/// so they are rejected before any per-key check.
fn check_known(raw: &RawUserConfig, rules: &RuleTable) -> Result<(), ConfigError> {
    match raw.iter().find(|(k, _)| !rules.contains(k.as_str())) {
        Some((key, value)) => Err(ConfigError::validation(key.as_str(), value, "unknown key")),
        None => Ok(()),
    }
}

/// Seed every settable key from the user value or the table default.
/// Values supplied for derived-only keys are left for `validate` to reject.
fn seed(raw: &RawUserConfig, rules: &RuleTable) -> Values {
    let mut values = Values::new();
    for rule in rules.iter() {
        let supplied = raw.get(rule.key().as_str());
        match (rule.source(), supplied) {
            (Source::Derived(_), _) | (Source::DerivedDefault(_), None) => {}
            (_, Some(value)) => {
                values.insert(
                    rule.key().clone(),
                    ResolvedEntry {
                        value: value.clone(),
                        origin: Origin::User,
                    },
                );
            }
            (Source::Default(default), None) => {
                values.insert(
                    rule.key().clone(),
                    ResolvedEntry {
                        value: default.clone(),
                        origin: Origin::Default,
                    },
                );
            }
        }
    }
    log::debug!("seed pass: {} keys seeded", values.len());
    values
}

/// Check supplied and default values in declaration order. A value supplied
/// for a derived-only key fails at that key's position.
fn validate(values: &Values, raw: &RawUserConfig, rules: &RuleTable) -> Result<(), ConfigError> {
    for rule in rules.iter() {
        if rule.is_derived_only() {
            if let Some(value) = raw.get(rule.key().as_str()) {
                return Err(ConfigError::validation(
                    rule.key().as_str(),
                    value,
                    "key is computed, not settable",
                ));
            }
            continue;
        }
        if let Some(entry) = values.get(rule.key().as_str()) {
            check_value(rule, &entry.value)?;
        }
    }
    Ok(())
}

fn check_value(rule: &Rule, value: &crate::value::OptionValue) -> Result<(), ConfigError> {
    if !rule.kind().admits(value) {
        return Err(ConfigError::validation(
            rule.key().as_str(),
            value,
            rule.kind().describe(),
        ));
    }
    if !rule.get_constraint().check(value) {
        return Err(ConfigError::validation(
            rule.key().as_str(),
            value,
            rule.get_constraint().describe(),
        ));
    }
    Ok(())
}

fn derive(values: &mut Values, raw: &RawUserConfig, rules: &RuleTable) -> Result<(), ConfigError> {
    for rule in rules.derivation_order() {
        let key = rule.key();
        if values.contains_key(key.as_str()) {
            // derived default the user already set
            continue;
        }
        let Some(derivation) = rule.derivation() else {
            return Err(ConfigError::invariant(format!(
                "'{}' is scheduled for derivation but has no derivation",
                key
            )));
        };

        let lookup = Lookup::new(values, derivation.inputs(), raw.hooks());
        let value = (derivation.compute)(&lookup).map_err(|e| derive_error(key, e))?;

        if !rule.kind().admits(&value) {
            return Err(ConfigError::invariant(format!(
                "derivation of '{}' produced a {} ({}), expected {}",
                key,
                value.type_name(),
                value,
                rule.kind().describe()
            )));
        }
        check_value(rule, &value)?;

        log::debug!("derived {} = {} from {}", key, value, derivation.expr());
        values.insert(
            key.clone(),
            ResolvedEntry {
                value,
                origin: Origin::Derived,
            },
        );
    }
    Ok(())
}

fn derive_error(key: &OptionKey, err: DeriveError) -> ConfigError {
    match err {
        DeriveError::Arithmetic(detail) => ConfigError::Derivation {
            key: key.to_string(),
            detail,
        },
        DeriveError::Undeclared(_) => ConfigError::dependency(key.as_str(), err.to_string()),
        DeriveError::Unresolved(_) | DeriveError::WrongKind { .. } => {
            ConfigError::invariant(format!("deriving '{}': {}", key, err))
        }
    }
}

fn check_complete(values: &Values, rules: &RuleTable) -> Result<(), ConfigError> {
    for rule in rules.iter() {
        if !values.contains_key(rule.key().as_str()) {
            return Err(ConfigError::invariant(format!(
                "'{}' has no value after resolution",
                rule.key()
            )));
        }
    }
    if values.len() != rules.len() {
        return Err(ConfigError::invariant(format!(
            "resolved {} keys for a table of {}",
            values.len(),
            rules.len()
        )));
    }
    Ok(())
}

fn check_consistency(values: &Values, raw: &RawUserConfig, rules: &RuleTable) -> Result<(), ConfigError> {
    for invariant in rules.invariants() {
        let lookup = Lookup::new(values, invariant.keys(), raw.hooks());
        match (invariant.check)(&lookup) {
            Ok(()) => {}
            Err(Violation::Violated(message)) => {
                log::debug!("invariant {} violated: {}", invariant.name(), message);
                return Err(ConfigError::Consistency {
                    rule: invariant.name().to_string(),
                    keys: invariant.keys().iter().map(|k| k.to_string()).collect(),
                    message,
                });
            }
            Err(Violation::Lookup(e)) => {
                return Err(ConfigError::invariant(format!(
                    "invariant '{}' could not read its keys: {}",
                    invariant.name(),
                    e
                )));
            }
        }
    }
    Ok(())
}

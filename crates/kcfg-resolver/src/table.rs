//! Rule table construction and schema checks.

use crate::error::ConfigError;
use crate::key::OptionKey;
use crate::rule::{Invariant, Rule, Source};
use std::collections::{BTreeMap, BTreeSet};

/// Immutable schema: one rule per key plus the cross-field invariants.
///
/// Rules keep their declaration order, which is the fixed ordering used to
/// pick the first error during resolution.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    index: BTreeMap<OptionKey, usize>,
    derive_order: Vec<usize>,
    invariants: Vec<Invariant>,
}

impl RuleTable {
    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.index.get(key).map(|&i| &self.rules[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Derived and derived-default rules in dependency order.
    pub fn derivation_order(&self) -> impl Iterator<Item = &Rule> {
        self.derive_order.iter().map(|&i| &self.rules[i])
    }

    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Collects rules and invariants, then checks them in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    rules: Vec<Rule>,
    invariants: Vec<Invariant>,
}

impl RuleTableBuilder {
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn invariant(mut self, invariant: Invariant) -> Self {
        self.invariants.push(invariant);
        self
    }

    pub fn invariants(mut self, invariants: impl IntoIterator<Item = Invariant>) -> Self {
        self.invariants.extend(invariants);
        self
    }

    /// Check the schema and compute the derivation order.
    ///
    /// Fails with `Dependency` on a derivation or invariant that references
    /// an unknown key, or on a cycle among derivations; fails with
    /// `Invariant` on malformed rows (bad key name, duplicate key, default
    /// of the wrong kind or outside its constraint).
    pub fn build(self) -> Result<RuleTable, ConfigError> {
        let mut index = BTreeMap::new();
        for (i, rule) in self.rules.iter().enumerate() {
            check_row(rule)?;
            if index.insert(rule.key.clone(), i).is_some() {
                return Err(ConfigError::invariant(format!(
                    "key '{}' is declared more than once",
                    rule.key
                )));
            }
        }

        for rule in &self.rules {
            if let Some(derivation) = rule.derivation() {
                for input in derivation.inputs() {
                    if !index.contains_key(input) {
                        return Err(ConfigError::dependency(
                            rule.key.as_str(),
                            format!("derivation input '{}' is not declared", input),
                        ));
                    }
                }
            }
        }

        for invariant in &self.invariants {
            for key in invariant.keys() {
                if !index.contains_key(key) {
                    return Err(ConfigError::dependency(
                        key.as_str(),
                        format!("invariant '{}' references an undeclared key", invariant.name),
                    ));
                }
            }
        }

        let derive_order = derivation_order(&self.rules, &index)?;
        log::debug!(
            "rule table built: {} rules, {} derived, {} invariants",
            self.rules.len(),
            derive_order.len(),
            self.invariants.len()
        );

        Ok(RuleTable {
            rules: self.rules,
            index,
            derive_order,
            invariants: self.invariants,
        })
    }
}

fn check_row(rule: &Rule) -> Result<(), ConfigError> {
    if !rule.key.is_well_formed() {
        return Err(ConfigError::invariant(format!(
            "key '{}' is not a lowercase identifier",
            rule.key
        )));
    }
    if rule.constraint.is_numeric() && rule.kind != crate::value::ValueKind::UInt {
        return Err(ConfigError::invariant(format!(
            "key '{}' has a numeric constraint but is not an unsigned integer",
            rule.key
        )));
    }
    if let Source::Default(default) = &rule.source {
        if !rule.admits(default) {
            return Err(ConfigError::invariant(format!(
                "default {} for '{}' is not admitted by its own rule",
                default, rule.key
            )));
        }
    }
    Ok(())
}

/// Topological order over derived keys, ties broken by declaration order.
///
/// Only edges between derived keys matter: plain keys are seeded before the
/// derive pass runs.
fn derivation_order(
    rules: &[Rule],
    index: &BTreeMap<OptionKey, usize>,
) -> Result<Vec<usize>, ConfigError> {
    let derived: BTreeSet<usize> = rules
        .iter()
        .enumerate()
        .filter(|(_, r)| r.derivation().is_some())
        .map(|(i, _)| i)
        .collect();

    // node -> derived inputs it waits on
    let mut pending: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for &i in &derived {
        let waits = rules[i]
            .derivation()
            .map(|d| {
                d.inputs()
                    .iter()
                    .filter_map(|k| index.get(k).copied())
                    .filter(|j| derived.contains(j))
                    .collect()
            })
            .unwrap_or_default();
        pending.insert(i, waits);
    }

    let mut order = Vec::with_capacity(derived.len());
    while !pending.is_empty() {
        let ready = pending
            .iter()
            .find(|(_, waits)| waits.is_empty())
            .map(|(&i, _)| i);
        let Some(next) = ready else {
            let first = *pending.keys().next().unwrap_or(&0);
            return Err(ConfigError::dependency(
                rules[first].key.as_str(),
                format!("derivation cycle: {}", describe_cycle(rules, &pending, first)),
            ));
        };
        pending.remove(&next);
        for waits in pending.values_mut() {
            waits.remove(&next);
        }
        order.push(next);
    }
    Ok(order)
}

/// Walk the remaining wait edges from `start` until a node repeats.
fn describe_cycle(rules: &[Rule], pending: &BTreeMap<usize, BTreeSet<usize>>, start: usize) -> String {
    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = pending.get(&current).and_then(|w| w.iter().next()) else {
            break;
        };
        if let Some(pos) = path.iter().position(|&n| n == next) {
            path.drain(..pos);
            path.push(next);
            break;
        }
        path.push(next);
        current = next;
    }
    path.iter()
        .map(|&i| rules[i].key.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

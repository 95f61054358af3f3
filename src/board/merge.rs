//! Layer merge logic
//!
//! Board layers merge by key:
//! - Tables: deep-merge by key
//! - Strict layers (board files and their includes): a key already set by
//!   an earlier layer must keep the same value, otherwise the merge fails
//! - Override layers (features, command line): last wins

use std::collections::BTreeMap;
use toml::{Table, Value};

/// How a layer treats keys already set by earlier layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Redefining a key with a different value is a conflict.
    Strict,
    /// The layer's value replaces the earlier one.
    Override,
}

/// Two layers disagree about a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    /// Dotted path of the key, e.g. `scheduler.tick_rate_hz`.
    pub key: String,
    /// Index of the layer that set the key first.
    pub first: usize,
    /// Index of the layer that tried to change it.
    pub second: usize,
}

/// Accumulated result of merging layers, with the layer that set each key.
#[derive(Debug, Clone, Default)]
pub struct Merged {
    pub table: Table,
    pub origins: BTreeMap<String, usize>,
}

impl Merged {
    /// Merge `overlay`, produced by layer number `layer`, into the result.
    pub fn merge(&mut self, overlay: Table, layer: usize, mode: MergeMode) -> Result<(), MergeConflict> {
        merge_into(&mut self.table, overlay, "", layer, mode, &mut self.origins)
    }
}

/// Layer that set `path`, or for a table path the earliest layer that set
/// a key below it.
fn first_origin(origins: &BTreeMap<String, usize>, path: &str) -> Option<usize> {
    if let Some(&layer) = origins.get(path) {
        return Some(layer);
    }
    let prefix = format!("{}.", path);
    origins
        .range(prefix.clone()..)
        .take_while(|(key, _)| key.starts_with(&prefix))
        .map(|(_, &layer)| layer)
        .min()
}

fn merge_into(
    base: &mut Table,
    overlay: Table,
    prefix: &str,
    layer: usize,
    mode: MergeMode,
    origins: &mut BTreeMap<String, usize>,
) -> Result<(), MergeConflict> {
    for (key, overlay_value) in overlay {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        let Some(existing) = base.get_mut(&key) else {
            let value = match overlay_value {
                // New table: merge into an empty one so every leaf gets an origin
                Value::Table(overlay_table) => {
                    let mut fresh = Table::new();
                    merge_into(&mut fresh, overlay_table, &path, layer, mode, origins)?;
                    Value::Table(fresh)
                }
                value => {
                    origins.insert(path, layer);
                    value
                }
            };
            base.insert(key, value);
            continue;
        };

        match (existing, overlay_value) {
            // Both tables: deep merge
            (Value::Table(base_table), Value::Table(overlay_table)) => {
                merge_into(base_table, overlay_table, &path, layer, mode, origins)?;
            }

            (existing, overlay_value) => {
                if mode == MergeMode::Strict && *existing == overlay_value {
                    continue;
                }
                if mode == MergeMode::Strict {
                    return Err(MergeConflict {
                        first: first_origin(origins, &path).unwrap_or(layer),
                        key: path,
                        second: layer,
                    });
                }
                *existing = overlay_value;
                origins.insert(path, layer);
            }
        }
    }
    Ok(())
}

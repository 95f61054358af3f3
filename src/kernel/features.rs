//! Cargo feature names that switch kernel options on.
//!
//! A kernel crate's build script sees its enabled features as
//! `CARGO_FEATURE_<NAME>` variables; each known feature turns one boolean
//! key on.

use kcfg_resolver::{Category, OptionKey, OptionValue, RawUserConfig};

/// Feature name, category, key.
pub const FEATURE_KEYS: &[(&str, Category, &str)] = &[
    ("delete-task", Category::Feature, "include_v_task_delete"),
    ("delay-until", Category::Feature, "include_v_task_delay_until"),
    (
        "stack-high-water",
        Category::Feature,
        "include_ux_task_get_stack_high_water_mark",
    ),
    ("heap-free-size", Category::Feature, "include_heap_free_size"),
    ("task-suspend", Category::Feature, "include_v_task_suspend"),
    ("recursive-mutex", Category::Feature, "use_recursive_mutexes"),
    ("counting-semaphore", Category::Feature, "use_counting_semaphores"),
    ("trace-facility", Category::Diagnostic, "use_trace_facility"),
];

const ENV_PREFIX: &str = "CARGO_FEATURE_";

/// Look up a feature by name. Underscore spellings are accepted.
pub fn lookup(name: &str) -> Option<(Category, &'static str)> {
    let normalized = name.trim().to_lowercase().replace('_', "-");
    FEATURE_KEYS
        .iter()
        .find(|(feature, _, _)| *feature == normalized)
        .map(|(_, category, key)| (*category, *key))
}

/// Keys switched on by the given feature names. Unknown names are skipped.
pub fn keys_for<'a, I>(names: I) -> Vec<(Category, &'static str)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut keys = Vec::new();
    for name in names {
        match lookup(name) {
            Some(entry) if !keys.contains(&entry) => keys.push(entry),
            Some(_) => {}
            None => log::debug!("feature '{}' does not map to a kernel option", name),
        }
    }
    keys
}

/// Turn on the keys for `names` in `raw`.
pub fn apply<'a, I>(raw: RawUserConfig, names: I) -> RawUserConfig
where
    I: IntoIterator<Item = &'a str>,
{
    keys_for(names)
        .into_iter()
        .fold(raw, |raw, (_, key)| raw.with(OptionKey::new(key), OptionValue::Bool(true)))
}

/// Feature names enabled in an environment, from `CARGO_FEATURE_*` = `1`.
pub fn from_env<I>(vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut names: Vec<String> = vars
        .into_iter()
        .filter(|(_, value)| value == "1")
        .filter_map(|(name, _)| {
            name.strip_prefix(ENV_PREFIX)
                .map(|feature| feature.to_lowercase().replace('_', "-"))
        })
        .filter(|feature| lookup(feature).is_some())
        .collect();
    names.sort();
    names
}

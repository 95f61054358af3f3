//! Merged board tables to [`RawUserConfig`].

use kcfg_resolver::{Category, OptionKey, OptionValue, RawUserConfig, RuleTable, ValueKind};
use toml::{Table, Value};

use super::BoardError;

/// Convert `[category] key = value` tables into raw settings.
///
/// Keys the rule table does not know pass through untouched so resolution
/// reports them; a known key under the wrong category is rejected here.
pub fn to_raw(table: &Table, rules: &RuleTable) -> Result<RawUserConfig, BoardError> {
    let mut raw = RawUserConfig::new();

    for (section, body) in table {
        let category: Category = section
            .parse()
            .map_err(|_| BoardError::UnknownCategory(section.clone()))?;
        let Value::Table(entries) = body else {
            return Err(BoardError::BadValue {
                key: section.clone(),
                detail: format!("expected a [{}] table", section),
            });
        };

        for (key, value) in entries {
            let rule = rules.get(key);
            if let Some(rule) = rule {
                if rule.category() != category {
                    return Err(BoardError::CategoryMismatch {
                        key: key.clone(),
                        expected: rule.category(),
                        found: category,
                    });
                }
            }
            let bool_key = rule.map_or(false, |r| r.kind() == ValueKind::Bool);
            let value = to_option_value(key, value, bool_key)?;
            raw = raw.with(OptionKey::new(key.as_str()), value);
        }
    }

    Ok(raw)
}

/// Rewrite integer 0/1 under boolean keys as TOML booleans, in place.
///
/// Layers are normalized before they merge so that `use_mutexes = 1` and
/// `use_mutexes = true` count as the same value.
pub fn normalize_flags(table: &mut Table, rules: &RuleTable) {
    for body in table.iter_mut().map(|(_, v)| v) {
        let Value::Table(entries) = body else {
            continue;
        };
        for (key, value) in entries.iter_mut() {
            let is_flag = rules
                .get(key)
                .map_or(false, |r| r.kind() == ValueKind::Bool);
            let flag = match value {
                Value::Integer(n @ (0 | 1)) if is_flag => Some(*n == 1),
                _ => None,
            };
            if let Some(b) = flag {
                *value = Value::Boolean(b);
            }
        }
    }
}

fn to_option_value(key: &str, value: &Value, bool_key: bool) -> Result<OptionValue, BoardError> {
    let bad = |detail: String| BoardError::BadValue {
        key: key.to_string(),
        detail,
    };

    match value {
        Value::Boolean(b) => Ok(OptionValue::Bool(*b)),
        Value::Integer(n) if *n < 0 => Err(bad(format!("{} is negative", n))),
        // `#define configUSE_X 1` style
        Value::Integer(n @ (0 | 1)) if bool_key => Ok(OptionValue::Bool(*n == 1)),
        Value::Integer(n) => Ok(OptionValue::UInt(*n as u64)),
        Value::String(s) => Ok(OptionValue::choice(s.as_str())),
        other => Err(bad(format!("unsupported {} value", other.type_str()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel;

    fn convert(src: &str) -> Result<RawUserConfig, BoardError> {
        let table: Table = toml::from_str(src).unwrap();
        to_raw(&table, kernel::rules().unwrap())
    }

    #[test]
    fn test_value_kinds() {
        let raw = convert(
            r#"
[scheduler]
tick_rate_hz = 1000
use_preemption = true

[trustzone]
trustzone_mode = "secure-only"
"#,
        )
        .unwrap();

        assert_eq!(raw.get("tick_rate_hz"), Some(&OptionValue::UInt(1000)));
        assert_eq!(raw.get("use_preemption"), Some(&OptionValue::Bool(true)));
        assert_eq!(raw.get("trustzone_mode"), Some(&OptionValue::choice("secure-only")));
    }

    #[test]
    fn test_integer_flags() {
        let raw = convert("[feature]\nuse_mutexes = 0\nuse_timers = 1\n").unwrap();
        assert_eq!(raw.get("use_mutexes"), Some(&OptionValue::Bool(false)));
        assert_eq!(raw.get("use_timers"), Some(&OptionValue::Bool(true)));

        // 2 stays an integer and fails kind validation later
        let raw = convert("[feature]\nuse_timers = 2\n").unwrap();
        assert_eq!(raw.get("use_timers"), Some(&OptionValue::UInt(2)));
    }

    #[test]
    fn test_normalize_flags() {
        let mut table: Table =
            toml::from_str("[feature]\nuse_mutexes = 1\nuse_timers = 0\ntimer_queue_length = 1\nuse_queue_sets = 2\n")
                .unwrap();
        normalize_flags(&mut table, kernel::rules().unwrap());

        let feature = table["feature"].as_table().unwrap();
        assert_eq!(feature["use_mutexes"], Value::Boolean(true));
        assert_eq!(feature["use_timers"], Value::Boolean(false));
        assert_eq!(feature["timer_queue_length"], Value::Integer(1));
        assert_eq!(feature["use_queue_sets"], Value::Integer(2));
    }

    #[test]
    fn test_negative_integer() {
        let err = convert("[memory]\ntotal_heap_size = -1\n").unwrap_err();
        assert!(matches!(err, BoardError::BadValue { ref key, .. } if key == "total_heap_size"));
    }

    #[test]
    fn test_float_rejected() {
        assert!(matches!(
            convert("[scheduler]\ntick_rate_hz = 1.5\n"),
            Err(BoardError::BadValue { .. })
        ));
    }

    #[test]
    fn test_unknown_category() {
        let err = convert("[network]\nmtu = 1500\n").unwrap_err();
        assert!(matches!(err, BoardError::UnknownCategory(ref c) if c == "network"));
    }

    #[test]
    fn test_category_mismatch() {
        match convert("[memory]\ntick_rate_hz = 100\n") {
            Err(BoardError::CategoryMismatch { key, expected, found }) => {
                assert_eq!(key, "tick_rate_hz");
                assert_eq!(expected, Category::Scheduler);
                assert_eq!(found, Category::Memory);
            }
            other => panic!("expected category mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_key_passes_through() {
        let raw = convert("[scheduler]\nuse_fair_share = true\n").unwrap();
        assert!(raw.contains("use_fair_share"));
    }

    #[test]
    fn test_top_level_scalar() {
        assert!(matches!(
            convert("scheduler = 3\n"),
            Err(BoardError::BadValue { .. })
        ));
    }
}

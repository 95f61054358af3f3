//! Command-line `--set category.key=value` overrides.

use regex_lite::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use toml::{Table, Value};

use super::BoardError;

/// One `category.key=value` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub category: String,
    pub key: String,
    pub value: Value,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z]+)\.([a-z][a-z0-9_]*)=(.+)$").expect("static override pattern")
    })
}

/// Interpret an override value the way a TOML scalar would read:
/// `true`/`false`, decimal or `0x` hex integers, anything else a string.
fn parse_value(text: &str) -> Result<Value, String> {
    match text {
        "true" => return Ok(Value::Boolean(true)),
        "false" => return Ok(Value::Boolean(false)),
        _ => {}
    }

    let number = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(i64::from_str_radix(hex, 16))
    } else if text.bytes().all(|b| b.is_ascii_digit()) {
        Some(text.parse::<i64>())
    } else {
        None
    };

    match number {
        Some(Ok(n)) => Ok(Value::Integer(n)),
        Some(Err(e)) => Err(format!("'{}' is not a usable integer: {}", text, e)),
        None if text.starts_with('-') => Err(format!("'{}': negative values are not allowed", text)),
        None => Ok(Value::String(text.to_string())),
    }
}

impl FromStr for Override {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = pattern().captures(trimmed).ok_or_else(|| {
            BoardError::BadOverride(format!("'{}' is not of the form category.key=value", trimmed))
        })?;

        let value = parse_value(caps[3].trim()).map_err(BoardError::BadOverride)?;
        Ok(Self {
            category: caps[1].to_string(),
            key: caps[2].to_string(),
            value,
        })
    }
}

/// Build one merge layer from a list of overrides; later entries win.
pub fn to_table(overrides: &[Override]) -> Table {
    let mut table = Table::new();
    for o in overrides {
        let entry = table
            .entry(o.category.clone())
            .or_insert_with(|| Value::Table(Table::new()));
        if let Value::Table(category) = entry {
            category.insert(o.key.clone(), o.value.clone());
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let o: Override = "scheduler.tick_rate_hz=500".parse().unwrap();
        assert_eq!(o.category, "scheduler");
        assert_eq!(o.key, "tick_rate_hz");
        assert_eq!(o.value, Value::Integer(500));

        let o: Override = "interrupt.library_lowest_interrupt_priority=0x07".parse().unwrap();
        assert_eq!(o.value, Value::Integer(7));

        let o: Override = "feature.use_timers=true".parse().unwrap();
        assert_eq!(o.value, Value::Boolean(true));

        let o: Override = "trustzone.trustzone_mode=secure-only".parse().unwrap();
        assert_eq!(o.value, Value::String("secure-only".to_string()));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["tick_rate_hz=5", "scheduler.tick_rate_hz", "Scheduler.x=1", "scheduler.x="] {
            assert!(
                matches!(bad.parse::<Override>(), Err(BoardError::BadOverride(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_rejects_negative_and_bad_hex() {
        assert!("memory.total_heap_size=-1".parse::<Override>().is_err());
        assert!("memory.total_heap_size=0xZZ".parse::<Override>().is_err());
    }

    #[test]
    fn test_later_override_wins_in_table() {
        let overrides: Vec<Override> = ["scheduler.max_priorities=5", "scheduler.max_priorities=7"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let table = to_table(&overrides);
        assert_eq!(table["scheduler"]["max_priorities"].as_integer(), Some(7));
    }
}

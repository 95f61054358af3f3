//! Resolution report with full provenance
//!
//! The report captures one target's resolved configuration plus where it
//! came from: the contributing layers with digests, the schema it was
//! resolved against, and when.

use chrono::{DateTime, Utc};
use kcfg_resolver::ResolvedConfig;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::board::{BoardConfig, ConfigSource};
use crate::kernel::{SCHEMA_ID, SCHEMA_VERSION};

/// Resolved configuration with provenance
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    /// Schema version of the kernel rule table
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When this config was resolved
    pub created_at: DateTime<Utc>,

    /// Board name
    pub board: String,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,

    /// Hooks the target supplies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<String>,

    /// Every key with its value and origin
    pub config: ResolvedConfig,
}

impl ResolutionReport {
    pub fn new(board: &BoardConfig, config: ResolvedConfig) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            board: board.name.clone(),
            sources: board.sources.clone(),
            hooks: board.raw.hooks().iter().cloned().collect(),
            config,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            )
        })?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardLoader;
    use tempfile::TempDir;

    fn report(contents: &str) -> ResolutionReport {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("demo.toml");
        fs::write(&path, contents).unwrap();
        let board = BoardLoader::new().load(&path).unwrap();
        let resolved = board.resolve().unwrap();
        ResolutionReport::new(&board, resolved)
    }

    #[test]
    fn test_report_json_shape() {
        let report = report("[board]\nname = \"demo-board\"\n\n[interrupt]\nprio_bits = 4\n");
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["schema_version"], SCHEMA_VERSION);
        assert_eq!(json["schema_id"], SCHEMA_ID);
        assert_eq!(json["board"], "demo-board");
        assert_eq!(json["sources"][0]["origin"], "board");
        assert_eq!(json["config"]["prio_bits"]["value"], 4);
        assert_eq!(json["config"]["prio_bits"]["origin"], "user");
        assert_eq!(json["config"]["kernel_interrupt_priority"]["value"], 0x70);
        assert_eq!(json["config"]["kernel_interrupt_priority"]["origin"], "derived");
        assert!(json.get("hooks").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let report = report("");
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("report.json");
        report.write_to_file(&out).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains("\"schema_id\""));
    }
}

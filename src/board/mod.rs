//! Board configuration loading
//!
//! Builds one target's [`RawUserConfig`] from layers:
//! 1. Board file includes, depth-first
//! 2. The board file itself
//! 3. Cargo feature names
//! 4. Command-line `--set` overrides
//!
//! File layers merge strictly; features and overrides win.

mod convert;
mod file;
mod merge;
mod overrides;

pub use convert::{normalize_flags, to_raw};
pub use file::{load_tree, BoardFile};
pub use merge::{MergeConflict, MergeMode, Merged};
pub use overrides::{to_table as overrides_table, Override};

use kcfg_resolver::{Category, ConfigError, RawUserConfig, ResolvedConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use toml::{Table, Value};

use crate::kernel;

/// Board loading errors
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("IO error: {path}: {message}")]
    Io { path: String, message: String },

    #[error("Parse error: {path}: {message}")]
    Parse { path: String, message: String },

    #[error("'{key}' is set to different values in {first} and {second}")]
    Conflict {
        key: String,
        first: String,
        second: String,
    },

    #[error("include cycle: {0}")]
    IncludeCycle(String),

    #[error("unknown category [{0}]")]
    UnknownCategory(String),

    #[error("'{key}' belongs in [{expected}], found in [{found}]")]
    CategoryMismatch {
        key: String,
        expected: Category,
        found: Category,
    },

    #[error("bad value for '{key}': {detail}")]
    BadValue { key: String, detail: String },

    #[error("bad override: {0}")]
    BadOverride(String),

    #[error(transparent)]
    Resolve(#[from] ConfigError),
}

impl BoardError {
    pub(crate) fn io(path: &Path, e: std::io::Error) -> Self {
        BoardError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        BoardError::Parse {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Whether the failure is a defect in the kernel rule table rather than
    /// in the board.
    pub fn is_schema_defect(&self) -> bool {
        matches!(self, BoardError::Resolve(e) if e.is_schema_defect())
    }
}

/// Origin of a configuration layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Board,
    Include,
    Feature,
    Cli,
}

impl SourceOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOrigin::Board => "board",
            SourceOrigin::Include => "include",
            SourceOrigin::Feature => "feature",
            SourceOrigin::Cli => "cli",
        }
    }
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigSource {
    pub origin: SourceOrigin,

    /// File path (None for feature/cli layers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for feature/cli layers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ConfigSource {
    fn file(origin: SourceOrigin, file: &BoardFile) -> Self {
        Self {
            origin,
            path: Some(file.path.display().to_string()),
            digest: Some(file.digest.clone()),
        }
    }

    fn generated(origin: SourceOrigin) -> Self {
        Self {
            origin,
            path: None,
            digest: None,
        }
    }

    /// Path for file layers, origin name otherwise.
    pub fn label(&self) -> &str {
        self.path.as_deref().unwrap_or(self.origin.as_str())
    }
}

/// A loaded board: raw settings ready for resolution plus provenance.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub name: String,
    pub raw: RawUserConfig,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,

    /// Option key -> index into `sources` of the layer that set it
    pub set_by: BTreeMap<String, usize>,
}

impl BoardConfig {
    /// Resolve against the kernel rule table.
    pub fn resolve(&self) -> Result<ResolvedConfig, BoardError> {
        Ok(kernel::resolve(&self.raw)?)
    }

    /// Layer that set `key`, if any layer did.
    pub fn source_of(&self, key: &str) -> Option<&ConfigSource> {
        self.set_by.get(key).and_then(|&i| self.sources.get(i))
    }
}

/// Loads board files with optional feature and override layers.
#[derive(Debug, Clone, Default)]
pub struct BoardLoader {
    features: Vec<String>,
    overrides: Vec<Override>,
    hooks: Vec<String>,
}

impl BoardLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature(mut self, name: impl Into<String>) -> Self {
        self.features.push(name.into());
        self
    }

    pub fn features<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_override(mut self, o: Override) -> Self {
        self.overrides.push(o);
        self
    }

    /// Parse and add a `category.key=value` override.
    pub fn set(self, assignment: &str) -> Result<Self, BoardError> {
        Ok(self.with_override(assignment.parse()?))
    }

    /// Hook supplied on top of those the board files declare.
    pub fn hook(mut self, name: impl Into<String>) -> Self {
        self.hooks.push(name.into());
        self
    }

    /// Load `path` and its includes, then apply features and overrides.
    pub fn load(&self, path: &Path) -> Result<BoardConfig, BoardError> {
        let rules = kernel::rules()?;
        let files = load_tree(path)?;

        let mut merged = Merged::default();
        let mut sources = Vec::with_capacity(files.len() + 2);
        let mut hooks: Vec<String> = Vec::new();
        let root = files.len().saturating_sub(1);

        for (i, file) in files.iter().enumerate() {
            let origin = if i == root {
                SourceOrigin::Board
            } else {
                SourceOrigin::Include
            };
            sources.push(ConfigSource::file(origin, file));
            let mut settings = file.settings.clone();
            normalize_flags(&mut settings, rules);
            merged
                .merge(settings, i, MergeMode::Strict)
                .map_err(|c| conflict(c, &sources))?;
            hooks.extend(file.hooks.iter().cloned());
        }

        if !self.features.is_empty() {
            sources.push(ConfigSource::generated(SourceOrigin::Feature));
            merged
                .merge(features_table(&self.features), sources.len() - 1, MergeMode::Override)
                .map_err(|c| conflict(c, &sources))?;
        }

        if !self.overrides.is_empty() {
            sources.push(ConfigSource::generated(SourceOrigin::Cli));
            let mut table = overrides_table(&self.overrides);
            normalize_flags(&mut table, rules);
            merged
                .merge(table, sources.len() - 1, MergeMode::Override)
                .map_err(|c| conflict(c, &sources))?;
        }

        let raw = to_raw(&merged.table, rules)?
            .with_hooks(hooks)
            .with_hooks(self.hooks.iter().cloned());

        let set_by = merged
            .origins
            .iter()
            .filter_map(|(path, &layer)| {
                path.split_once('.').map(|(_, key)| (key.to_string(), layer))
            })
            .collect();

        let name = files
            .last()
            .and_then(|f| f.name.clone())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_default();

        log::info!(
            "board '{}': {} layer(s), {} key(s) set",
            name,
            sources.len(),
            raw.len()
        );

        Ok(BoardConfig {
            name,
            raw,
            sources,
            set_by,
        })
    }
}

fn conflict(c: MergeConflict, sources: &[ConfigSource]) -> BoardError {
    let label = |i: usize| {
        sources
            .get(i)
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| format!("layer {}", i))
    };
    BoardError::Conflict {
        first: label(c.first),
        second: label(c.second),
        key: c.key,
    }
}

/// One override layer switching on the keys for the named features.
fn features_table(names: &[String]) -> Table {
    let mut table = Table::new();
    for (category, key) in kernel::features::keys_for(names.iter().map(String::as_str)) {
        let entry = table
            .entry(category.as_str().to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if let Value::Table(section) = entry {
            section.insert(key.to_string(), Value::Boolean(true));
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("demo.toml");
        fs::write(&path, "[scheduler]\ntick_rate_hz = 500\n").unwrap();

        let board = BoardLoader::new().load(&path).unwrap();
        assert_eq!(board.name, "demo");
        assert_eq!(board.sources.len(), 1);
        assert_eq!(board.sources[0].origin, SourceOrigin::Board);
        assert_eq!(board.sources[0].digest.as_ref().map(String::len), Some(64));
        assert_eq!(board.source_of("tick_rate_hz"), Some(&board.sources[0]));

        let resolved = board.resolve().unwrap();
        assert_eq!(resolved.get_u64("tick_rate_hz"), Some(500));
    }

    #[test]
    fn test_features_and_overrides_layer_last() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("demo.toml");
        fs::write(&path, "[feature]\nuse_recursive_mutexes = false\n").unwrap();

        let board = BoardLoader::new()
            .feature("recursive-mutex")
            .set("scheduler.max_priorities=7")
            .unwrap()
            .load(&path)
            .unwrap();

        let origins: Vec<_> = board.sources.iter().map(|s| s.origin).collect();
        assert_eq!(
            origins,
            vec![SourceOrigin::Board, SourceOrigin::Feature, SourceOrigin::Cli]
        );
        assert_eq!(board.source_of("use_recursive_mutexes").map(|s| s.origin), Some(SourceOrigin::Feature));
        assert_eq!(board.source_of("max_priorities").map(|s| s.label()), Some("cli"));

        let resolved = board.resolve().unwrap();
        assert_eq!(resolved.get_bool("use_recursive_mutexes"), Some(true));
        assert_eq!(resolved.get_u64("max_priorities"), Some(7));
    }

    #[test]
    fn test_conflict_names_both_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("common.toml"), "[scheduler]\ntick_rate_hz = 1000\n").unwrap();
        let path = dir.path().join("board.toml");
        fs::write(
            &path,
            "[board]\ninclude = [\"common.toml\"]\n\n[scheduler]\ntick_rate_hz = 100\n",
        )
        .unwrap();

        match BoardLoader::new().load(&path) {
            Err(BoardError::Conflict { key, first, second }) => {
                assert_eq!(key, "scheduler.tick_rate_hz");
                assert!(first.ends_with("common.toml"));
                assert!(second.ends_with("board.toml"));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_hooks_collected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickless.toml");
        fs::write(
            &path,
            "[board]\nhooks = [\"suppress_ticks_and_sleep\"]\n\n[scheduler]\nuse_tickless_idle = true\n",
        )
        .unwrap();

        let board = BoardLoader::new().hook("idle").load(&path).unwrap();
        assert!(board.raw.hooks().contains("suppress_ticks_and_sleep"));
        assert!(board.raw.hooks().contains("idle"));
        assert!(board.resolve().is_ok());
    }

    #[test]
    fn test_schema_defect_flag() {
        let err = BoardError::Resolve(ConfigError::Invariant {
            detail: "gap".to_string(),
        });
        assert!(err.is_schema_defect());
        assert!(!BoardError::BadOverride("x".to_string()).is_schema_defect());
    }
}

//! Reading board files and their includes.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use toml::Table;

use super::BoardError;

/// Name of the table holding board metadata rather than options.
const BOARD_TABLE: &str = "board";

/// One parsed board file.
#[derive(Debug, Clone)]
pub struct BoardFile {
    /// Path as it was reached (root argument or include joined to its parent)
    pub path: PathBuf,

    /// SHA-256 digest of raw file bytes
    pub digest: String,

    pub name: Option<String>,

    /// Include paths, relative to this file's directory
    pub includes: Vec<String>,

    pub hooks: Vec<String>,

    /// Category tables, with `[board]` removed
    pub settings: Table,

    canonical: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoardHeader {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    hooks: Vec<String>,
}

impl BoardFile {
    /// Read and parse a board file, recording its digest.
    pub fn read(path: &Path) -> Result<Self, BoardError> {
        let bytes = fs::read(path).map_err(|e| BoardError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| BoardError::parse(path, format!("invalid UTF-8: {}", e)))?;

        let mut file = Self::parse(path, &contents, digest)?;
        file.canonical = fs::canonicalize(path).map_err(|e| BoardError::io(path, e))?;
        Ok(file)
    }

    /// Parse board file contents that were already read.
    pub fn parse(path: &Path, contents: &str, digest: String) -> Result<Self, BoardError> {
        let mut settings: Table =
            toml::from_str(contents).map_err(|e| BoardError::parse(path, e.to_string()))?;

        let header = match settings.remove(BOARD_TABLE) {
            None => BoardHeader::default(),
            Some(value) => value
                .try_into::<BoardHeader>()
                .map_err(|e| BoardError::parse(path, format!("[board]: {}", e)))?,
        };

        Ok(Self {
            path: path.to_path_buf(),
            digest,
            name: header.name,
            includes: header.include,
            hooks: header.hooks,
            settings,
            canonical: path.to_path_buf(),
        })
    }
}

/// Load `root` and everything it includes, depth-first, includes before
/// the file that names them. A file reached twice is loaded once.
pub fn load_tree(root: &Path) -> Result<Vec<BoardFile>, BoardError> {
    let mut files = Vec::new();
    let mut stack = Vec::new();
    visit(root, &mut stack, &mut files)?;
    Ok(files)
}

fn visit(path: &Path, stack: &mut Vec<PathBuf>, files: &mut Vec<BoardFile>) -> Result<(), BoardError> {
    let canonical = fs::canonicalize(path).map_err(|e| BoardError::io(path, e))?;

    if let Some(pos) = stack.iter().position(|p| *p == canonical) {
        let chain: Vec<String> = stack[pos..]
            .iter()
            .chain(std::iter::once(&canonical))
            .map(|p| p.display().to_string())
            .collect();
        return Err(BoardError::IncludeCycle(chain.join(" -> ")));
    }
    if files.iter().any(|f| f.canonical == canonical) {
        return Ok(());
    }

    let file = BoardFile::read(path)?;
    log::debug!("loaded board file {} ({})", path.display(), &file.digest[..12]);

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    stack.push(canonical);
    for include in &file.includes {
        visit(&dir.join(include), stack, files)?;
    }
    stack.pop();

    files.push(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_board_header() {
        let file = BoardFile::parse(
            Path::new("nrf9160.toml"),
            r#"
[board]
name = "nrf9160"
include = ["common.toml"]
hooks = ["idle"]

[scheduler]
tick_rate_hz = 1000
"#,
            String::new(),
        )
        .unwrap();

        assert_eq!(file.name.as_deref(), Some("nrf9160"));
        assert_eq!(file.includes, vec!["common.toml"]);
        assert_eq!(file.hooks, vec!["idle"]);
        assert!(!file.settings.contains_key("board"));
        assert!(file.settings.contains_key("scheduler"));
    }

    #[test]
    fn test_unknown_board_field() {
        let result = BoardFile::parse(
            Path::new("x.toml"),
            "[board]\nincludes = [\"a.toml\"]\n",
            String::new(),
        );
        assert!(matches!(result, Err(BoardError::Parse { .. })));
    }

    #[test]
    fn test_digest_is_sha256_of_bytes() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.toml", "");
        let file = BoardFile::read(&path).unwrap();
        assert_eq!(
            file.digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_includes_load_first() {
        let dir = TempDir::new().unwrap();
        write(&dir, "base.toml", "[memory]\nminimal_stack_size = 256\n");
        write(&dir, "mid.toml", "[board]\ninclude = [\"base.toml\"]\n");
        let root = write(
            &dir,
            "top.toml",
            "[board]\ninclude = [\"mid.toml\", \"base.toml\"]\n",
        );

        let files = load_tree(&root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["base.toml", "mid.toml", "top.toml"]);
    }

    #[test]
    fn test_include_cycle() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.toml", "[board]\ninclude = [\"b.toml\"]\n");
        write(&dir, "b.toml", "[board]\ninclude = [\"a.toml\"]\n");

        match load_tree(&dir.path().join("a.toml")) {
            Err(BoardError::IncludeCycle(chain)) => {
                assert!(chain.contains("a.toml"));
                assert!(chain.contains("b.toml"));
            }
            other => panic!("expected include cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_include() {
        let dir = TempDir::new().unwrap();
        let root = write(&dir, "a.toml", "[board]\ninclude = [\"missing.toml\"]\n");
        assert!(matches!(load_tree(&root), Err(BoardError::Io { .. })));
    }
}

//! Test fixtures for board loading and header output
//!
//! This module provides:
//! - Paths to the shipped board files under `boards/`
//! - Helpers for writing throwaway board files into a temp directory

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Names of the boards shipped in `boards/`
pub const SHIPPED_BOARDS: &[&str] = &["cortex-m33-secure", "nrf9160", "win-sim"];

/// Path to the shipped boards directory
pub fn boards_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("boards")
}

/// Path to a shipped board by name
pub fn board_path(name: &str) -> PathBuf {
    boards_dir().join(format!("{}.toml", name))
}

/// Temp directory holding board files written by a test
pub struct BoardDir {
    dir: TempDir,
}

impl BoardDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Write `contents` to `name` and return its path
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

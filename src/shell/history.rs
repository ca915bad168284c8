//! Command history persisted across sessions.
//!
//! One line per command in `~/.dynsh_history`. Empty lines, the `it` command
//! and consecutive duplicates are not persisted; `it` in particular would
//! otherwise fill the file every time someone walks a long result set.

use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};

const HISTORY_FILE: &str = ".dynsh_history";

pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        History {
            path: PathBuf::from(home).join(HISTORY_FILE),
        }
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        History {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored entries, oldest first. A missing or unreadable file is just an
    /// empty history.
    pub fn load(&self) -> Vec<String> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Persist one command, applying the skip rules.
    pub fn append(&self, line: &str) -> Result<()> {
        let line = line.trim();
        if !should_persist(line) {
            return Ok(());
        }

        let mut entries = self.load();
        if entries.last().map(String::as_str) == Some(line) {
            return Ok(());
        }
        entries.push(line.to_string());
        self.save(&entries)
    }

    fn save(&self, entries: &[String]) -> Result<()> {
        let mut contents = entries.join("\n");
        contents.push('\n');
        std::fs::write(&self.path, contents)
            .map_err(|e| Error::Logic(format!("Failed to write history file: {}", e)))
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn should_persist(line: &str) -> bool {
    !line.is_empty() && line != "it"
}

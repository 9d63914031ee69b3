//! The persisted configuration source behind the settings editor.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::loader::{self, ConfigError};

/// On-disk YAML source: read for display, validate candidates, and replace
/// with a backup of the previous text.
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path the previous source is copied to on each save.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Current text of the persisted source, for display in the editor.
    pub fn read(&self) -> Result<String, ConfigError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Validate, back up the previous source, then overwrite.
    ///
    /// The backup and the write happen only after validation succeeds, so a
    /// bad candidate leaves both the file and its backup untouched.
    pub fn save(&self, text: &str) -> Result<(), ConfigError> {
        loader::validate_str(text)?;

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path())?;
        }
        fs::write(&self.path, text)?;
        tracing::info!(path = ?self.path, "configuration source replaced");
        Ok(())
    }
}

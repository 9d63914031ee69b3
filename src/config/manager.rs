//! Process-wide configuration lifecycle.

use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::loader::{self, ConfigError};
use crate::config::model::Configuration;

/// Owns the active configuration snapshot for the whole process.
///
/// Readers take an [`Arc`] snapshot and use it for the remainder of their
/// request; a reload swaps the published reference atomically, so a reader
/// never observes a partially built tree. A failed reload leaves the
/// previous snapshot published.
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
    current: ArcSwap<Configuration>,
}

impl ConfigManager {
    /// First load. There is no previous snapshot to fall back to, so callers
    /// at process start treat an error as fatal.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = loader::load_file(&path)?;
        tracing::info!(
            path = ?path,
            servers = config.servers.len(),
            categories = config.categories.len(),
            "configuration loaded"
        );
        Ok(Self {
            current: ArcSwap::from_pointee(config),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<Configuration> {
        self.current.load_full()
    }

    /// Re-read and re-validate the source, then publish the new snapshot.
    ///
    /// On error nothing is swapped; the configuration that was current
    /// before the call stays current.
    pub fn reload(&self) -> Result<Arc<Configuration>, ConfigError> {
        let config = Arc::new(loader::load_file(&self.path)?);
        self.current.store(Arc::clone(&config));
        tracing::info!(path = ?self.path, "configuration reloaded");
        Ok(config)
    }
}

//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::model::Configuration;
use crate::config::schema::{self, SchemaError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The source bytes are not well-formed YAML.
    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document parsed but violated a schema constraint.
    #[error("invalid configuration at {0}")]
    Schema(#[from] SchemaError),
}

/// Parse, validate and construct a configuration from YAML text.
pub fn load_str(text: &str) -> Result<Configuration, ConfigError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
    let raw = schema::validate(&doc)?;
    Ok(Configuration::from_raw(raw))
}

/// Check candidate text without committing anything.
///
/// Used by the settings editor before a save; returns the same error shape
/// as every other entry point, never a raw parser panic.
pub fn validate_str(text: &str) -> Result<(), ConfigError> {
    load_str(text).map(|_| ())
}

/// Load and validate a configuration from a YAML file.
pub fn load_file(path: &Path) -> Result<Configuration, ConfigError> {
    let text = fs::read_to_string(path)?;
    let config = load_str(&text)?;
    tracing::debug!(path = ?path, servers = config.servers.len(), "configuration file loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ill_formed_yaml_is_a_parse_error() {
        let err = load_str("global: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_schema_violation_is_a_schema_error() {
        let err = load_str("global: {}\nservers: {}\nmisc: {}\nweb: {}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = load_file(Path::new("/nonexistent/config.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

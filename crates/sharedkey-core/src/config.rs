//! Runtime configuration.
//!
//! Loaded from TOML; every key is optional and unknown keys are rejected.
//!
//! ```toml
//! debug = true
//! read_consistency = "strict"
//! max_row_bytes = 65536
//! ```

use crate::{
    db::ReadConsistency,
    error::{ErrorClass, ErrorOrigin, InternalError},
};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error as ThisError;

/// Max serialized bytes for a single row to keep value loads bounded.
pub const MAX_ROW_BYTES: u32 = 4 * 1024 * 1024;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("max_row_bytes must be greater than zero")]
    ZeroRowLimit,
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        let class = match err {
            ConfigError::Io { .. } => ErrorClass::NotFound,
            ConfigError::Parse(_) | ConfigError::ZeroRowLimit => ErrorClass::Unsupported,
        };

        Self::new(class, ErrorOrigin::Config, err.to_string())
    }
}

///
/// DbConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Emit verbose per-phase events for every session.
    pub debug: bool,

    /// Missing-row policy applied when a session does not override it.
    pub read_consistency: ReadConsistency,

    /// Upper bound on one encoded row.
    pub max_row_bytes: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            debug: false,
            read_consistency: ReadConsistency::MissingOk,
            max_row_bytes: MAX_ROW_BYTES,
        }
    }
}

impl DbConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_row_bytes == 0 {
            return Err(ConfigError::ZeroRowLimit);
        }

        Ok(())
    }

    #[must_use]
    pub const fn max_row_bytes(&self) -> usize {
        self.max_row_bytes as usize
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let config = DbConfig::from_toml_str("").unwrap();
        assert_eq!(config, DbConfig::default());
    }

    #[test]
    fn parses_all_keys() {
        let config = DbConfig::from_toml_str(
            r#"
            debug = true
            read_consistency = "strict"
            max_row_bytes = 1024
            "#,
        )
        .unwrap();

        assert!(config.debug);
        assert_eq!(config.read_consistency, ReadConsistency::Strict);
        assert_eq!(config.max_row_bytes(), 1024);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = DbConfig::from_toml_str("cache = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_zero_row_limit() {
        let err = DbConfig::from_toml_str("max_row_bytes = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroRowLimit));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DbConfig::load("/nonexistent/sharedkey.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

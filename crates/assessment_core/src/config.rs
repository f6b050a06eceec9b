//! Builder configuration.
//!
//! # Responsibility
//! - Hold host-provided settings for storage keys, autosave, and logging.
//! - Parse and validate the JSON form hosts pass over FFI.
//!
//! # Invariants
//! - A validated config has a non-empty key prefix and a positive autosave
//!   interval.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "assessment-builder";
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Errors from parsing or validating a config.
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    EmptyStorageKeyPrefix,
    ZeroAutosaveInterval,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid config: {err}"),
            Self::EmptyStorageKeyPrefix => write!(f, "storage_key_prefix cannot be empty"),
            Self::ZeroAutosaveInterval => {
                write!(f, "autosave_interval_secs must be greater than zero")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::EmptyStorageKeyPrefix | Self::ZeroAutosaveInterval => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub storage_key_prefix: String,
    pub autosave_interval_secs: u64,
    pub logging: LoggingConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.to_string(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            logging: LoggingConfig::default(),
        }
    }
}

impl BuilderConfig {
    /// Parses and validates a JSON config. Missing fields take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<Self>(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKeyPrefix);
        }
        if self.autosave_interval_secs == 0 {
            return Err(ConfigError::ZeroAutosaveInterval);
        }
        Ok(())
    }

    /// Blob key for the assessment of one job posting.
    pub fn storage_key(&self, job_id: &str) -> String {
        format!("{}:{}", self.storage_key_prefix, job_id)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}

/// File logging settings. Logging stays off while `log_dir` is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when unset.
    pub level: Option<String>,
    /// Absolute directory for rotating log files.
    pub log_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{BuilderConfig, ConfigError};
    use std::time::Duration;

    #[test]
    fn empty_object_uses_defaults() {
        let config = BuilderConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BuilderConfig::default());
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert_eq!(config.storage_key("job-9"), "assessment-builder:job-9");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = BuilderConfig::from_json_str(r#"{"autosave_interval_secs": 0}"#);
        assert!(matches!(result, Err(ConfigError::ZeroAutosaveInterval)));
    }

    #[test]
    fn blank_prefix_is_rejected() {
        let result = BuilderConfig::from_json_str(r#"{"storage_key_prefix": "  "}"#);
        assert!(matches!(result, Err(ConfigError::EmptyStorageKeyPrefix)));
    }
}

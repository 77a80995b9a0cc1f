//! Configuration key access and validation.
//!
//! Gives the CLI get/set access to [`ConfigFile`] fields by `section.key`
//! name, validating values the same way the INI parser does.

use std::str::FromStr;

use thiserror::Error;

use super::file::ConfigFile;
use super::parser::{parse_number, parse_positive, parse_url};

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServiceLabelUrl,
    ServiceMetadataUrl,
    ServiceTileUrl,
    ServiceTimeoutSecs,
    BatchingDebounceMs,
    BatchingThreshold,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s.to_lowercase())
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::ServiceLabelUrl,
            ConfigKey::ServiceMetadataUrl,
            ConfigKey::ServiceTileUrl,
            ConfigKey::ServiceTimeoutSecs,
            ConfigKey::BatchingDebounceMs,
            ConfigKey::BatchingThreshold,
        ]
    }

    /// Get the canonical key name (e.g., "service.label_url").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ServiceLabelUrl => "service.label_url",
            ConfigKey::ServiceMetadataUrl => "service.metadata_url",
            ConfigKey::ServiceTileUrl => "service.tile_url",
            ConfigKey::ServiceTimeoutSecs => "service.timeout_secs",
            ConfigKey::BatchingDebounceMs => "batching.debounce_ms",
            ConfigKey::BatchingThreshold => "batching.threshold",
        }
    }

    /// Get the section name (e.g., "service").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "label_url").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ServiceLabelUrl => config.service.label_url.clone(),
            ConfigKey::ServiceMetadataUrl => config.service.metadata_url.clone(),
            ConfigKey::ServiceTileUrl => config.service.tile_url.clone(),
            ConfigKey::ServiceTimeoutSecs => config.service.timeout_secs.to_string(),
            ConfigKey::BatchingDebounceMs => config.batching.debounce_ms.to_string(),
            ConfigKey::BatchingThreshold => config.batching.threshold.to_string(),
        }
    }

    /// Validate `value` and store it in `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let (section, key) = (self.section(), self.key_name());
        let failed = |e: super::file::ConfigFileError| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: match e {
                super::file::ConfigFileError::InvalidValue { reason, .. } => reason,
                other => other.to_string(),
            },
        };

        match self {
            ConfigKey::ServiceLabelUrl => {
                config.service.label_url = parse_url(section, key, value).map_err(failed)?;
            }
            ConfigKey::ServiceMetadataUrl => {
                config.service.metadata_url = parse_url(section, key, value).map_err(failed)?;
            }
            ConfigKey::ServiceTileUrl => {
                config.service.tile_url = parse_url(section, key, value).map_err(failed)?;
            }
            ConfigKey::ServiceTimeoutSecs => {
                config.service.timeout_secs =
                    parse_positive(section, key, value).map_err(failed)?;
            }
            ConfigKey::BatchingDebounceMs => {
                config.batching.debounce_ms = parse_number(section, key, value).map_err(failed)?;
            }
            ConfigKey::BatchingThreshold => {
                config.batching.threshold = parse_positive(section, key, value).map_err(failed)?;
            }
        }
        Ok(())
    }
}

//! Configuration file handling for ~/.tilelabel/config.ini.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::engine::EngineConfig;
use crate::coordinator::{DEFAULT_BATCH_THRESHOLD, DEFAULT_DEBOUNCE};
use crate::service::DEFAULT_HTTP_TIMEOUT;

/// Default base url of the label, metadata and tile services.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[service]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Base url of the label-lookup service.
    pub label_url: String,
    /// Base url of the image-metadata service.
    pub metadata_url: String,
    /// Base url tile urls are built from.
    pub tile_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            label_url: DEFAULT_SERVICE_URL.to_string(),
            metadata_url: DEFAULT_SERVICE_URL.to_string(),
            tile_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT.as_secs(),
        }
    }
}

/// `[batching]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchingSettings {
    pub debounce_ms: u64,
    pub threshold: usize,
}

impl Default for BatchingSettings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            threshold: DEFAULT_BATCH_THRESHOLD,
        }
    }
}

/// Contents of the user configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub service: ServiceSettings,
    pub batching: BatchingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilelabel/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Engine settings described by this file.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_debounce(Duration::from_millis(self.batching.debounce_ms))
            .with_batch_threshold(self.batching.threshold)
            .with_lookup_timeout(self.lookup_timeout())
    }

    /// Timeout applied to every service request.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }
}

/// Get the path to the config directory (~/.tilelabel).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilelabel")
}

/// Get the path to the config file (~/.tilelabel/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

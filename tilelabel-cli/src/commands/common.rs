//! Common types and utilities shared across CLI commands.

use std::time::Duration;

use clap::Args;
use tilelabel::config::ConfigFile;
use tilelabel::service::HttpLabelService;

use crate::error::CliError;

/// Service endpoints, overriding the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct ServiceArgs {
    /// Label lookup service base url
    #[arg(long)]
    pub label_url: Option<String>,

    /// Image metadata service base url
    #[arg(long)]
    pub metadata_url: Option<String>,

    /// Tile server base url that tile urls are built from
    #[arg(long)]
    pub tile_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Endpoints after applying CLI overrides to the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Services {
    pub label_url: String,
    pub metadata_url: String,
    pub tile_url: String,
    pub timeout: Duration,
}

impl ServiceArgs {
    /// Resolve endpoints. CLI takes precedence, then config.
    pub fn resolve(&self, config: &ConfigFile) -> Services {
        Services {
            label_url: self
                .label_url
                .clone()
                .unwrap_or_else(|| config.service.label_url.clone()),
            metadata_url: self
                .metadata_url
                .clone()
                .unwrap_or_else(|| config.service.metadata_url.clone()),
            tile_url: self
                .tile_url
                .clone()
                .unwrap_or_else(|| config.service.tile_url.clone()),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.lookup_timeout()),
        }
    }
}

impl Services {
    pub fn label_service(&self) -> Result<HttpLabelService, CliError> {
        HttpLabelService::new(&self.label_url, self.timeout).map_err(CliError::ServiceCreation)
    }
}

/// Parse a tile given as `level/x/y`.
pub fn parse_tile_spec(s: &str) -> Result<(u32, u32, u32), String> {
    let parts: Vec<&str> = s.split('/').collect();
    let [level, x, y] = parts.as_slice() else {
        return Err(format!("expected level/x/y, got '{}'", s));
    };
    let number = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a tile coordinate in '{}'", part, s))
    };
    Ok((number(level)?, number(x)?, number(y)?))
}

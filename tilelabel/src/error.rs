//! Error types for label lookups, session configuration and the engine.
//!
//! Label lookup errors ([`LookupError`]) never leave the coordinator: they are
//! logged and recorded as negative cache entries. Configuration errors are
//! fatal to a session and are returned to the UI shell.

use std::time::Duration;

use thiserror::Error;

/// Errors from the remote label-lookup service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The request could not be sent or the connection failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within its time budget.
    #[error("Lookup timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl LookupError {
    /// Whether this is a network-class failure (as opposed to a decode failure).
    pub fn is_network(&self) -> bool {
        !matches!(self, LookupError::Decode(_))
    }
}

/// Missing or invalid tiling parameters for an image set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A required field was absent from the image metadata.
    #[error("Image metadata is missing '{0}'")]
    MissingField(&'static str),

    /// A field was present but unusable.
    #[error("Invalid {field} = {value}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The image set name cannot address tiles.
    #[error("Invalid image set name '{0}'")]
    InvalidImageSet(String),

    /// The metadata service could not be reached or answered badly.
    #[error("Image metadata unavailable for '{image_set}': {reason}")]
    MetadataUnavailable { image_set: String, reason: String },
}

/// Errors returned by the engine handle to the UI shell.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session could not be initialized.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The engine task is no longer running.
    #[error("Label engine has shut down")]
    Shutdown,
}

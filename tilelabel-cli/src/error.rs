//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilelabel::config::ConfigFileError;
use tilelabel::{ConfigurationError, EngineError, LookupError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// Failed to create the label service client
    ServiceCreation(LookupError),
    /// Image tiling could not be determined
    Image(ConfigurationError),
    /// The label engine failed
    Engine(EngineError),
    /// Failed to read a replay script
    ScriptRead { path: String, error: std::io::Error },
    /// A replay script line could not be parsed
    Script { line: usize, reason: String },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Image(ConfigurationError::MetadataUnavailable { .. }) => {
                eprintln!();
                eprintln!("The image metadata service could not be used. Either:");
                eprintln!("  1. Check service.metadata_url with: tilelabel config get service.metadata_url");
                eprintln!("  2. Pass the tiling directly: --width --height --tile-size --max-level");
            }
            CliError::Script { .. } => {
                eprintln!();
                eprintln!("Script lines are one of:");
                eprintln!("  open | fail <reason> | draw <level> <x> <y> | zoom <0.0-1.0> | wait <ms> | destroy");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::ServiceCreation(e) => write!(f, "Failed to create label service: {}", e),
            CliError::Image(e) => write!(f, "Cannot open image: {}", e),
            CliError::Engine(e) => write!(f, "Label engine error: {}", e),
            CliError::ScriptRead { path, error } => {
                write!(f, "Failed to read script '{}': {}", path, error)
            }
            CliError::Script { line, reason } => write!(f, "Script line {}: {}", line, reason),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::ServiceCreation(e) => Some(e),
            CliError::Image(e) => Some(e),
            CliError::Engine(e) => Some(e),
            CliError::ScriptRead { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Configuration(e) => CliError::Image(e),
            other => CliError::Engine(other),
        }
    }
}

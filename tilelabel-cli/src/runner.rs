//! Shared setup for commands that talk to the label services.

use tilelabel::config::ConfigFile;
use tilelabel::logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Logging and configuration for one CLI invocation.
///
/// Logging stays active for as long as the runner lives.
pub struct CliRunner {
    config: ConfigFile,
    _logging_guard: LoggingGuard,
}

impl CliRunner {
    /// Initialize logging and load the config file.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let filter = if verbose { "debug" } else { "info" };
        let logging_guard = init_logging(&default_log_dir(), default_log_file(), filter)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;
        let config = ConfigFile::load()?;

        Ok(Self {
            config,
            _logging_guard: logging_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log the command being run and where logs go.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command,
            log_file = %default_log_dir().join(default_log_file()).display(),
            "tilelabel starting"
        );
    }
}

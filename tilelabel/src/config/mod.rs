//! Configuration.
//!
//! [`EngineConfig`] carries the batching and timeout settings the engine runs
//! with. [`ConfigFile`] is the user's `~/.tilelabel/config.ini`, from which an
//! `EngineConfig` and the service urls are derived.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tilelabel::config::EngineConfig;
//!
//! let config = EngineConfig::default()
//!     .with_debounce(Duration::from_millis(50))
//!     .with_batch_threshold(20);
//! assert_eq!(config.batch_policy().threshold, 20);
//! ```

mod engine;
mod file;
mod keys;
mod parser;
mod writer;

pub use engine::EngineConfig;
pub use file::{
    config_directory, config_file_path, BatchingSettings, ConfigFile, ConfigFileError,
    ServiceSettings, DEFAULT_SERVICE_URL,
};
pub use keys::{ConfigKey, ConfigKeyError};

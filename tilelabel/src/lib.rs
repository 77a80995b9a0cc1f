//! TileLabel - Label overlays for deep-zoom image viewers
//!
//! This library keeps on-screen label markers in step with the tiles a
//! deep-zoom viewer draws. Labels come from a remote lookup service; requests
//! are debounced, batched and cached per session, and markers always match the
//! viewer's active zoom level even when lookups complete out of order or fail.
//!
//! # Modules
//!
//! - [`engine`] - the actor that owns a session and the handle that drives it
//! - [`session`] - state of one image set between `start()` and `stop()`
//! - [`coordinator`] - debounce/threshold batching and batch resolution
//! - [`cache`] - per-session label cache
//! - [`zoom`] - continuous zoom to discrete level
//! - [`overlay`] - marker set and the drawing surface it mirrors to
//! - [`service`] - label and metadata services
//! - [`tile`] - tile identifiers and pyramid geometry

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod logging;
pub mod overlay;
pub mod service;
pub mod session;
pub mod stats;
pub mod tile;
pub mod viewport;
pub mod zoom;

pub use engine::{EngineHandle, LabelEngine};
pub use error::{ConfigurationError, EngineError, LookupError};
pub use viewport::{ViewerStatus, ViewportEvents};

//! The label engine: an actor that owns one viewer session at a time.
//!
//! ```text
//!  viewer ──ViewportEvents──┐
//!                           ▼
//!  shell ──EngineHandle──► commands ──► LabelEngine ──► OverlaySurface
//!                                        │     ▲
//!                              spawn     │     │ completions (tagged
//!                              lookup    ▼     │ with the session id)
//!                                      resolve_batch
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilelabel::config::EngineConfig;
//! use tilelabel::engine::LabelEngine;
//! use tilelabel::overlay::MarkerBoard;
//! use tilelabel::service::HttpLabelService;
//!
//! let service = Arc::new(HttpLabelService::new("http://localhost:8000", timeout)?);
//! let handle = LabelEngine::spawn(EngineConfig::default(), service, Box::new(MarkerBoard::new()));
//!
//! handle.start(params).await?;
//! handle.on_zoom_changed(0.5);
//! handle.on_tile_drawn(2, 3, 4, bounds);
//! ```

mod actor;
mod command;
mod handle;

pub use actor::LabelEngine;
pub use handle::EngineHandle;

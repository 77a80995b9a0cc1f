//! The subscription interface towards the deep-zoom viewer.
//!
//! The viewer itself renders tiles and is not part of this crate. It reports
//! what it does through [`ViewportEvents`]; the engine handle implements the
//! trait by queueing a [`ViewportEvent`] for the engine task, so handlers are
//! never run concurrently with each other.

use std::fmt;

use crate::tile::TileBounds;

/// A notification from the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    /// The image opened successfully.
    Open,
    /// The image could not be opened.
    OpenFailed(String),
    /// A tile finished drawing at `bounds`.
    TileDrawn {
        level: u32,
        x: u32,
        y: u32,
        bounds: TileBounds,
    },
    /// The normalized zoom changed.
    ZoomChanged(f64),
    /// The viewer was torn down.
    Destroy,
}

/// Callbacks a deep-zoom viewer delivers to the label engine.
pub trait ViewportEvents {
    fn on_open(&self);

    fn on_open_failed(&self, reason: &str);

    /// A tile at `(level, x, y)` was drawn at `bounds` in image coordinates.
    fn on_tile_drawn(&self, level: u32, x: u32, y: u32, bounds: TileBounds);

    /// `normalized_zoom` runs from `0.0` (whole image) to `1.0` (deepest level).
    fn on_zoom_changed(&self, normalized_zoom: f64);

    fn destroy(&self);
}

/// Where the viewer is in its lifecycle, as seen by the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewerStatus {
    /// No session.
    #[default]
    Inactive,
    /// A session started and the viewer is opening the image.
    Opening,
    /// The viewer opened the image.
    Ready,
    /// The image cannot be shown. The shell should offer a way back.
    Failed(String),
}

impl ViewerStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, ViewerStatus::Failed(_))
    }
}

impl fmt::Display for ViewerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerStatus::Inactive => write!(f, "inactive"),
            ViewerStatus::Opening => write!(f, "opening"),
            ViewerStatus::Ready => write!(f, "ready"),
            ViewerStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

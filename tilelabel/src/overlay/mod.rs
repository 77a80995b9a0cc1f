//! Overlay markers and the renderer that owns them.
//!
//! The [`OverlayRenderer`] keeps exactly one marker per labelled tile at the
//! active zoom level. The UI shell observes the set through an
//! [`OverlaySurface`]; [`MarkerBoard`] is a ready-made surface for shells
//! that would rather poll.

mod marker;
mod renderer;
mod surface;

pub use marker::{OverlayId, OverlayMarker};
pub use renderer::{MarkerChange, OverlayRenderer};
pub use surface::{MarkerBoard, NoopSurface, OverlaySurface};

//! Overlay surfaces: where marker mutations end up.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::marker::{OverlayId, OverlayMarker};

/// Receiver of marker mutations, implemented by the UI shell.
///
/// The renderer calls these methods from the engine task only, one at a time
/// and in order. Implementations must not block.
pub trait OverlaySurface: Send + 'static {
    /// A marker appeared.
    fn create(&mut self, marker: &OverlayMarker);

    /// An existing marker changed its text or bounds.
    fn update(&mut self, marker: &OverlayMarker);

    /// A marker was destroyed.
    fn remove(&mut self, id: &OverlayId);
}

/// Surface that discards every mutation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSurface;

impl OverlaySurface for NoopSurface {
    fn create(&mut self, _marker: &OverlayMarker) {}
    fn update(&mut self, _marker: &OverlayMarker) {}
    fn remove(&mut self, _id: &OverlayId) {}
}

/// Shared mirror of the marker set for shells that poll.
///
/// Clones share the same board, so the shell keeps one clone and hands the
/// other to the engine. Reads never wait on the engine task.
///
/// # Example
///
/// ```
/// use tilelabel::overlay::{MarkerBoard, OverlayMarker, OverlaySurface};
/// use tilelabel::tile::{TileBounds, TileId};
///
/// let board = MarkerBoard::new();
/// let mut engine_side = board.clone();
///
/// let tile = TileId::new("m31", 2, 3, 4);
/// engine_side.create(&OverlayMarker::new(&tile, TileBounds::default(), "M31"));
///
/// assert_eq!(board.len(), 1);
/// assert_eq!(board.snapshot()[0].label(), "M31");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MarkerBoard {
    markers: Arc<RwLock<BTreeMap<OverlayId, OverlayMarker>>>,
}

impl MarkerBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every marker, ordered by overlay id.
    pub fn snapshot(&self) -> Vec<OverlayMarker> {
        self.markers.read().values().cloned().collect()
    }

    /// Look up one marker.
    pub fn get(&self, id: &OverlayId) -> Option<OverlayMarker> {
        self.markers.read().get(id).cloned()
    }

    /// Number of markers currently shown.
    pub fn len(&self) -> usize {
        self.markers.read().len()
    }

    /// Whether no markers are shown.
    pub fn is_empty(&self) -> bool {
        self.markers.read().is_empty()
    }
}

impl OverlaySurface for MarkerBoard {
    fn create(&mut self, marker: &OverlayMarker) {
        self.markers.write().insert(marker.id(), marker.clone());
    }

    fn update(&mut self, marker: &OverlayMarker) {
        self.markers.write().insert(marker.id(), marker.clone());
    }

    fn remove(&mut self, id: &OverlayId) {
        self.markers.write().remove(id);
    }
}

//! The overlay renderer: sole owner of the on-screen marker set.

use std::collections::HashMap;

use tracing::debug;

use super::marker::{OverlayId, OverlayMarker};
use super::surface::OverlaySurface;
use crate::tile::{TileBounds, TileId};

/// Result of an [`OverlayRenderer::add_or_update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerChange {
    /// A new marker was created.
    Created,
    /// An existing marker was changed in place.
    Updated,
    /// The existing marker already matched.
    Unchanged,
    /// The tile is not at the active level.
    WrongLevel,
    /// The label was empty.
    EmptyLabel,
}

/// Owns the markers shown for the active zoom level.
///
/// Every mutation is mirrored to the [`OverlaySurface`] supplied by the shell.
/// The renderer refuses markers for any level other than the active one and
/// markers without text, so its set never mixes levels.
pub struct OverlayRenderer {
    active_level: Option<u32>,
    markers: HashMap<OverlayId, OverlayMarker>,
    surface: Box<dyn OverlaySurface>,
}

impl OverlayRenderer {
    /// Create a renderer drawing onto `surface`. No level is active yet.
    pub fn new(surface: Box<dyn OverlaySurface>) -> Self {
        Self {
            active_level: None,
            markers: HashMap::new(),
            surface,
        }
    }

    /// The level markers are currently accepted for.
    pub fn active_level(&self) -> Option<u32> {
        self.active_level
    }

    /// Switch the accepted level, destroying every marker when it changes.
    pub fn set_active_level(&mut self, level: Option<u32>) {
        if self.active_level != level {
            self.remove_all();
            self.active_level = level;
        }
    }

    /// Show `label` over `tile`, creating or updating its marker.
    pub fn add_or_update(&mut self, tile: &TileId, bounds: TileBounds, label: &str) -> MarkerChange {
        if label.is_empty() {
            return MarkerChange::EmptyLabel;
        }
        if self.active_level != Some(tile.level()) {
            return MarkerChange::WrongLevel;
        }

        let id = OverlayId::for_tile(tile);
        match self.markers.get_mut(&id) {
            Some(marker) => {
                if marker.label() == label && marker.bounds() == bounds {
                    return MarkerChange::Unchanged;
                }
                marker.set_label(label);
                marker.set_bounds(bounds);
                self.surface.update(marker);
                MarkerChange::Updated
            }
            None => {
                let marker = OverlayMarker::new(tile, bounds, label);
                self.surface.create(&marker);
                self.markers.insert(id, marker);
                MarkerChange::Created
            }
        }
    }

    /// Destroy every marker. Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        let count = self.markers.len();
        for (id, _) in self.markers.drain() {
            self.surface.remove(&id);
        }
        if count > 0 {
            debug!(count, "Removed all overlay markers");
        }
        count
    }

    /// Look up a marker.
    pub fn get(&self, id: &OverlayId) -> Option<&OverlayMarker> {
        self.markers.get(id)
    }

    /// Copy of the marker set, ordered by overlay id.
    pub fn snapshot(&self) -> Vec<OverlayMarker> {
        let mut markers: Vec<_> = self.markers.values().cloned().collect();
        markers.sort_by_key(|m| m.id());
        markers
    }

    /// Number of markers shown.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether no markers are shown.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl std::fmt::Debug for OverlayRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRenderer")
            .field("active_level", &self.active_level)
            .field("markers", &self.markers.len())
            .finish()
    }
}

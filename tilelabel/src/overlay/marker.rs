//! Overlay marker types.

use std::fmt;

use crate::tile::{TileBounds, TileId};

/// Identity of a marker, derived from the tile's level and grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId {
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

impl OverlayId {
    /// The overlay id for `tile`.
    pub fn for_tile(tile: &TileId) -> Self {
        Self {
            level: tile.level(),
            x: tile.x(),
            y: tile.y(),
        }
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label-{}-{}-{}", self.level, self.x, self.y)
    }
}

/// A label drawn over one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMarker {
    id: OverlayId,
    bounds: TileBounds,
    label: String,
}

impl OverlayMarker {
    /// Create a marker for `tile`.
    pub fn new(tile: &TileId, bounds: TileBounds, label: impl Into<String>) -> Self {
        Self {
            id: OverlayId::for_tile(tile),
            bounds,
            label: label.into(),
        }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn bounds(&self) -> TileBounds {
        self.bounds
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn level(&self) -> u32 {
        self.id.level
    }

    pub(crate) fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub(crate) fn set_bounds(&mut self, bounds: TileBounds) {
        self.bounds = bounds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_id_ignores_image_set() {
        let a = OverlayId::for_tile(&TileId::new("a", 2, 3, 4));
        let b = OverlayId::for_tile(&TileId::new("b", 2, 3, 4));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "label-2-3-4");
    }

    #[test]
    fn test_marker_fields() {
        let tile = TileId::new("m31", 2, 3, 4);
        let marker = OverlayMarker::new(&tile, TileBounds::new(1.0, 2.0, 3.0, 4.0), "M31");
        assert_eq!(marker.level(), 2);
        assert_eq!(marker.label(), "M31");
        assert_eq!(marker.bounds().max_y(), 6.0);
    }
}

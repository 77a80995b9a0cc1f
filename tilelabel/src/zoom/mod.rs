//! Zoom level tracking.
//!
//! The viewer reports zoom as a continuous value normalized to `0.0..=1.0`
//! across the pyramid. The tracker maps it onto a discrete pyramid level and
//! reports only actual level changes, so small zoom adjustments within one
//! level never disturb the overlay.

use tracing::{debug, warn};

/// A transition between active levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    /// Level before the change, `None` for the first level of a session.
    pub from: Option<u32>,
    /// Newly active level.
    pub to: u32,
}

/// Converts continuous zoom into the active pyramid level.
#[derive(Debug, Clone)]
pub struct ZoomLevelTracker {
    max_level: u32,
    active_level: Option<u32>,
}

impl ZoomLevelTracker {
    /// Create a tracker for a pyramid with levels `0..=max_level`.
    pub fn new(max_level: u32) -> Self {
        Self {
            max_level,
            active_level: None,
        }
    }

    /// Discrete level for a normalized zoom value.
    ///
    /// Returns `None` when `normalized_zoom` is not finite.
    ///
    /// # Example
    ///
    /// ```
    /// use tilelabel::zoom::ZoomLevelTracker;
    ///
    /// let tracker = ZoomLevelTracker::new(4);
    /// assert_eq!(tracker.discrete_level(0.5), Some(2));
    /// assert_eq!(tracker.discrete_level(1.7), Some(4));
    /// assert_eq!(tracker.discrete_level(-0.2), Some(0));
    /// ```
    pub fn discrete_level(&self, normalized_zoom: f64) -> Option<u32> {
        if !normalized_zoom.is_finite() {
            return None;
        }
        let raw = (normalized_zoom * self.max_level as f64).round();
        Some(raw.clamp(0.0, self.max_level as f64) as u32)
    }

    /// Feed a zoom-changed notification.
    ///
    /// Returns the transition when the discrete level changed.
    pub fn on_zoom_changed(&mut self, normalized_zoom: f64) -> Option<LevelChange> {
        let Some(level) = self.discrete_level(normalized_zoom) else {
            warn!(zoom = normalized_zoom, "Ignoring non-finite zoom value");
            return None;
        };

        if self.active_level == Some(level) {
            return None;
        }

        let change = LevelChange {
            from: self.active_level,
            to: level,
        };
        self.active_level = Some(level);
        debug!(from = ?change.from, to = level, "Active zoom level changed");
        Some(change)
    }

    /// Currently active level, if a zoom notification has been seen.
    pub fn active_level(&self) -> Option<u32> {
        self.active_level
    }

    /// Deepest level of the pyramid.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }
}

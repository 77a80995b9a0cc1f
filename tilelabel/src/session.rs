//! One viewer session: everything that lives between `start()` and `stop()`.
//!
//! A [`LabelSession`] owns the label cache, the request coordinator and the
//! zoom tracker for a single image set. It is a plain synchronous object; the
//! engine task drives it and supplies the overlay renderer, which outlives
//! sessions because it is bound to the shell's drawing surface.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::{LabelCache, LabelState};
use crate::coordinator::{
    BatchPolicy, BatchResolution, EnqueueOutcome, FlushBatch, PendingRequest, RequestCoordinator,
};
use crate::error::ConfigurationError;
use crate::overlay::OverlayRenderer;
use crate::stats::SessionStats;
use crate::tile::{TileBounds, TileId, TilingParameters};
use crate::viewport::ViewerStatus;
use crate::zoom::{LevelChange, ZoomLevelTracker};

/// Identity of a session, used to tag lookups issued on its behalf.
///
/// The generation increases with every `start()`, so two sessions on the same
/// image set never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    generation: u64,
    image_set: Arc<str>,
}

impl SessionId {
    pub fn new(generation: u64, image_set: impl Into<Arc<str>>) -> Self {
        Self {
            generation,
            image_set: image_set.into(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image_set(&self) -> &str {
        &self.image_set
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.image_set, self.generation)
    }
}

/// The image a session is started for.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    /// Name of the image set on the tile server.
    pub image_set: String,
    /// Deepest pyramid level.
    pub max_level: u32,
    /// Static tiling of the full-resolution image.
    pub tiling: TilingParameters,
    /// Base url tile urls are built from.
    pub tile_base_url: String,
}

impl SessionParams {
    pub fn new(
        image_set: impl Into<String>,
        max_level: u32,
        tiling: TilingParameters,
        tile_base_url: impl Into<String>,
    ) -> Self {
        Self {
            image_set: image_set.into(),
            max_level,
            tiling,
            tile_base_url: tile_base_url.into(),
        }
    }

    /// Check that a session can be built from these parameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let name = self.image_set.trim();
        if name.is_empty() || name.contains('/') {
            return Err(ConfigurationError::InvalidImageSet(self.image_set.clone()));
        }
        self.tiling.validate(self.max_level)
    }
}

/// Labels, pending lookups and the active zoom level of one image set.
#[derive(Debug)]
pub struct LabelSession {
    id: SessionId,
    params: SessionParams,
    cache: LabelCache,
    coordinator: RequestCoordinator,
    zoom: ZoomLevelTracker,
    status: ViewerStatus,
}

impl LabelSession {
    /// Build a session. `params` must already be validated.
    pub fn new(id: SessionId, params: SessionParams, policy: BatchPolicy) -> Self {
        let zoom = ZoomLevelTracker::new(params.max_level);
        Self {
            id,
            params,
            cache: LabelCache::new(),
            coordinator: RequestCoordinator::new(policy),
            zoom,
            status: ViewerStatus::Opening,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn status(&self) -> &ViewerStatus {
        &self.status
    }

    pub fn stats(&self) -> SessionStats {
        self.coordinator.stats()
    }

    pub fn active_level(&self) -> Option<u32> {
        self.zoom.active_level()
    }

    /// When the coordinator wants to flush, if it is accumulating.
    pub fn deadline(&self) -> Option<Instant> {
        self.coordinator.deadline()
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    pub fn on_open(&mut self) {
        self.status = ViewerStatus::Ready;
    }

    pub fn on_open_failed(&mut self, reason: &str) {
        self.status = ViewerStatus::Failed(reason.to_string());
    }

    fn tile(&self, level: u32, x: u32, y: u32) -> TileId {
        TileId::new(self.id.image_set.clone(), level, x, y)
    }

    fn url(&self, tile: &TileId) -> String {
        tile.absolute_url(&self.params.tile_base_url)
    }

    fn analytic_bounds(&self, tile: &TileId) -> Option<TileBounds> {
        self.params
            .tiling
            .tile_bounds(tile.level(), tile.x(), tile.y(), self.params.max_level)
    }

    /// Handle a tile-drawn notification.
    ///
    /// Cached labels go straight to the renderer. Anything else is queued.
    /// Tiles outside the pyramid are ignored and yield `None`.
    pub fn on_tile_drawn(
        &mut self,
        renderer: &mut OverlayRenderer,
        level: u32,
        x: u32,
        y: u32,
        bounds: TileBounds,
        now: Instant,
    ) -> Option<EnqueueOutcome> {
        let tile = self.tile(level, x, y);
        if self.analytic_bounds(&tile).is_none() {
            debug!(tile = %tile, "Ignoring tile outside the image pyramid");
            return None;
        }

        let url = self.url(&tile);
        let outcome = self.coordinator.enqueue(
            &self.cache,
            PendingRequest::new(tile.clone(), url, Some(bounds)),
            now,
        );

        if let EnqueueOutcome::Resolved(LabelState::Label(text)) = &outcome {
            trace!(tile = %tile, "Label served from cache");
            renderer.add_or_update(&tile, bounds, text);
        }
        Some(outcome)
    }

    /// Handle a zoom-changed notification.
    ///
    /// On a level change the renderer is cleared and rebuilt from the cache
    /// in one pass, using bounds computed from the tiling parameters.
    pub fn on_zoom_changed(
        &mut self,
        renderer: &mut OverlayRenderer,
        normalized_zoom: f64,
    ) -> Option<LevelChange> {
        let change = self.zoom.on_zoom_changed(normalized_zoom)?;
        renderer.set_active_level(Some(change.to));

        let mut shown = 0;
        for (tile, label) in self.cache.labels_at_level(change.to) {
            let Some(bounds) = self.analytic_bounds(tile) else {
                continue;
            };
            renderer.add_or_update(tile, bounds, label);
            shown += 1;
        }
        debug!(level = change.to, markers = shown, "Rebuilt overlay for new level");
        Some(change)
    }

    /// Assemble the next batch, if anything is pending.
    pub fn begin_flush(&mut self) -> Option<FlushBatch> {
        self.coordinator.begin_flush(&self.cache)
    }

    /// Store the answers for `batch` and show those at the active level.
    pub fn complete_flush(
        &mut self,
        renderer: &mut OverlayRenderer,
        batch: FlushBatch,
        resolution: BatchResolution,
        now: Instant,
    ) {
        let resolved = self
            .coordinator
            .complete_flush(&mut self.cache, batch, resolution, now);
        let active = self.zoom.active_level();

        for tile in resolved {
            let Some(label) = tile.label else { continue };
            if Some(tile.tile.level()) != active {
                continue;
            }
            let Some(bounds) = tile.bounds.or_else(|| self.analytic_bounds(&tile.tile)) else {
                continue;
            };
            renderer.add_or_update(&tile.tile, bounds, &label);
        }
    }

    /// Cache state for `tile`. Tiles of other image sets are unresolved.
    pub fn query_label(&self, tile: &TileId) -> LabelState {
        if tile.image_set() != self.id.image_set() {
            return LabelState::Unresolved;
        }
        self.cache.get(&self.url(tile))
    }

    /// End the session: drop pending work and every marker.
    pub fn teardown(mut self, renderer: &mut OverlayRenderer) -> SessionStats {
        self.coordinator.reset();
        self.cache.clear();
        renderer.set_active_level(None);
        self.coordinator.stats()
    }
}

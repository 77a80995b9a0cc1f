//! Integration tests for the label engine.
//!
//! These tests drive a spawned engine through its handle the way a viewer
//! and a UI shell would:
//! - Tile-drawn events → debounced batch → cache → overlay markers
//! - Batch failure → sequential single lookups with timeouts
//! - Zoom level transitions rebuilding the marker set
//! - Session teardown suppressing in-flight results
//!
//! Time is paused, so debounce intervals and timeouts elapse instantly.
//!
//! Run with: `cargo test --test label_engine_integration`

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use tilelabel::cache::LabelState;
use tilelabel::config::EngineConfig;
use tilelabel::engine::{EngineHandle, LabelEngine};
use tilelabel::error::{ConfigurationError, EngineError, LookupError};
use tilelabel::overlay::MarkerBoard;
use tilelabel::service::{ImageInfo, LabelService, MetadataSource};
use tilelabel::session::SessionParams;
use tilelabel::tile::{TileBounds, TileId, TilingParameters};
use tilelabel::viewport::{ViewerStatus, ViewportEvents};

// ============================================================================
// Test Services
// ============================================================================

const TILE_BASE: &str = "http://tiles.test";
const IMAGE_SET: &str = "m31";
const MAX_LEVEL: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Batch(Vec<String>),
    Single(String),
}

/// Label service answering from a fixed table.
#[derive(Default)]
struct MockLabels {
    labels: HashMap<String, String>,
    fail_batches: bool,
    hanging: HashSet<String>,
    batch_delay: Duration,
    calls: Mutex<Vec<Call>>,
}

impl MockLabels {
    fn new() -> Self {
        Self::default()
    }

    fn with_label(mut self, url: &str, label: &str) -> Self {
        self.labels.insert(url.to_string(), label.to_string());
        self
    }

    fn failing_batches(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    fn hanging(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Batch(urls) => Some(urls),
                Call::Single(_) => None,
            })
            .collect()
    }

    fn times_requested(&self, url: &str) -> usize {
        self.calls()
            .iter()
            .map(|call| match call {
                Call::Batch(urls) => urls.iter().filter(|u| *u == url).count(),
                Call::Single(u) => usize::from(u == url),
            })
            .sum()
    }
}

impl LabelService for MockLabels {
    fn lookup_batch<'a>(
        &'a self,
        urls: &'a [String],
    ) -> BoxFuture<'a, Result<HashMap<String, String>, LookupError>> {
        Box::pin(async move {
            self.calls.lock().push(Call::Batch(urls.to_vec()));
            if !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            if self.fail_batches {
                return Err(LookupError::Status {
                    status: 500,
                    url: "batch".to_string(),
                });
            }
            Ok(urls
                .iter()
                .filter_map(|u| self.labels.get(u).map(|l| (u.clone(), l.clone())))
                .collect())
        })
    }

    fn lookup_one<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<String>, LookupError>> {
        Box::pin(async move {
            self.calls.lock().push(Call::Single(url.to_string()));
            if self.hanging.contains(url) {
                std::future::pending::<()>().await;
            }
            Ok(self.labels.get(url).cloned())
        })
    }
}

/// Metadata source with a fixed answer.
struct MockMetadata(Result<ImageInfo, ConfigurationError>);

impl MetadataSource for MockMetadata {
    fn image_info<'a>(
        &'a self,
        _image_set: &'a str,
    ) -> BoxFuture<'a, Result<ImageInfo, ConfigurationError>> {
        Box::pin(async move { self.0.clone() })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// An 8192px square image: level 2 is an 8x8 grid, level 3 a 16x16 grid.
fn tiling() -> TilingParameters {
    TilingParameters::new(8192, 8192, 256)
}

fn params() -> SessionParams {
    SessionParams::new(IMAGE_SET, MAX_LEVEL, tiling(), TILE_BASE)
}

fn tile(level: u32, x: u32, y: u32) -> TileId {
    TileId::new(IMAGE_SET, level, x, y)
}

fn url(level: u32, x: u32, y: u32) -> String {
    tile(level, x, y).absolute_url(TILE_BASE)
}

fn drawn(x: f64, y: f64) -> TileBounds {
    TileBounds::new(x, y, 0.125, 0.125)
}

fn analytic(level: u32, x: u32, y: u32) -> TileBounds {
    tiling().tile_bounds(level, x, y, MAX_LEVEL).unwrap()
}

async fn spawn_engine(
    config: EngineConfig,
    service: Arc<MockLabels>,
) -> (EngineHandle, MarkerBoard) {
    let board = MarkerBoard::new();
    let handle = LabelEngine::spawn(config, service, Box::new(board.clone()));
    handle.start(params()).await.unwrap();
    (handle, board)
}

async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}

// ============================================================================
// Lookup Flow
// ============================================================================

/// A drawn tile produces one batch after the debounce and a marker once the
/// label arrives.
#[tokio::test(start_paused = true)]
async fn test_drawn_tile_gets_label_marker() {
    let service = Arc::new(MockLabels::new().with_label(&url(2, 3, 4), "M31"));
    let (handle, board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_open();
    handle.on_zoom_changed(0.5);
    handle.on_tile_drawn(2, 3, 4, drawn(0.375, 0.5));

    settle(Duration::from_millis(50)).await;
    assert!(service.calls().is_empty(), "Debounce has not elapsed yet");

    settle(Duration::from_millis(100)).await;
    assert_eq!(service.calls(), vec![Call::Batch(vec![url(2, 3, 4)])]);

    let markers = handle.markers().await.unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].label(), "M31");
    assert_eq!(markers[0].bounds(), drawn(0.375, 0.5));
    assert_eq!(board.len(), 1);

    assert_eq!(
        handle.query_label(tile(2, 3, 4)).await.unwrap(),
        LabelState::Label("M31".to_string())
    );
    assert_eq!(handle.status().await.unwrap(), ViewerStatus::Ready);
}

/// Urls missing from the batch response become negative cache entries.
#[tokio::test(start_paused = true)]
async fn test_omitted_urls_resolve_to_no_label() {
    let service = Arc::new(MockLabels::new().with_label(&url(2, 0, 0), "arm"));
    let (handle, board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_zoom_changed(0.5);
    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    handle.on_tile_drawn(2, 1, 0, drawn(0.125, 0.0));
    settle(Duration::from_millis(200)).await;

    assert_eq!(
        handle.query_label(tile(2, 1, 0)).await.unwrap(),
        LabelState::NoLabel
    );
    assert_eq!(board.len(), 1);

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.session.batches_issued, 1);
    assert_eq!(stats.session.labels_resolved, 1);
    assert_eq!(stats.session.labels_missing, 1);
}

/// A failed batch falls back to one lookup per url. A lookup that hangs is
/// cut off by the timeout and recorded as "no label".
#[tokio::test(start_paused = true)]
async fn test_batch_failure_falls_back_to_single_lookups() {
    let service = Arc::new(
        MockLabels::new()
            .with_label(&url(2, 0, 0), "nucleus")
            .with_label(&url(2, 1, 0), "dust lane")
            .failing_batches()
            .hanging(&url(2, 2, 0)),
    );
    let config = EngineConfig::default().with_lookup_timeout(Duration::from_secs(1));
    let (handle, board) = spawn_engine(config, service.clone()).await;

    handle.on_open();
    handle.on_zoom_changed(0.5);
    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    handle.on_tile_drawn(2, 1, 0, drawn(0.125, 0.0));
    handle.on_tile_drawn(2, 2, 0, drawn(0.25, 0.0));

    settle(Duration::from_secs(5)).await;

    assert_eq!(
        service.calls(),
        vec![
            Call::Batch(vec![url(2, 0, 0), url(2, 1, 0), url(2, 2, 0)]),
            Call::Single(url(2, 0, 0)),
            Call::Single(url(2, 1, 0)),
            Call::Single(url(2, 2, 0)),
        ]
    );
    assert_eq!(
        handle.query_label(tile(2, 0, 0)).await.unwrap(),
        LabelState::Label("nucleus".to_string())
    );
    assert_eq!(
        handle.query_label(tile(2, 1, 0)).await.unwrap(),
        LabelState::Label("dust lane".to_string())
    );
    assert_eq!(
        handle.query_label(tile(2, 2, 0)).await.unwrap(),
        LabelState::NoLabel
    );
    assert_eq!(board.len(), 2);
    assert_eq!(handle.status().await.unwrap(), ViewerStatus::Ready);

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.session.batch_failures, 1);
    assert_eq!(stats.session.fallback_lookups, 3);
}

// ============================================================================
// Batching
// ============================================================================

/// Reaching the threshold flushes without waiting for the debounce.
#[tokio::test(start_paused = true)]
async fn test_threshold_flushes_immediately() {
    let service = Arc::new(MockLabels::new());
    let config = EngineConfig::default()
        .with_debounce(Duration::from_secs(10))
        .with_batch_threshold(3);
    let (handle, _board) = spawn_engine(config, service.clone()).await;

    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    handle.on_tile_drawn(2, 1, 0, drawn(0.125, 0.0));
    handle.on_tile_drawn(2, 2, 0, drawn(0.25, 0.0));
    handle.on_tile_drawn(2, 3, 0, drawn(0.375, 0.0));

    settle(Duration::from_millis(10)).await;
    assert_eq!(
        service.batches(),
        vec![vec![url(2, 0, 0), url(2, 1, 0), url(2, 2, 0)]]
    );

    settle(Duration::from_secs(10)).await;
    assert_eq!(service.batches().len(), 2);
    assert_eq!(service.batches()[1], vec![url(2, 3, 0)]);
}

/// Every enqueue restarts the quiet period.
#[tokio::test(start_paused = true)]
async fn test_debounce_restarts_on_each_draw() {
    let service = Arc::new(MockLabels::new());
    let (handle, _board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    settle(Duration::from_millis(60)).await;
    handle.on_tile_drawn(2, 1, 0, drawn(0.125, 0.0));
    settle(Duration::from_millis(60)).await;
    assert!(service.batches().is_empty());

    settle(Duration::from_millis(60)).await;
    assert_eq!(service.batches(), vec![vec![url(2, 0, 0), url(2, 1, 0)]]);
}

/// Redraws while pending, while in flight and after resolution never reach
/// the service a second time.
#[tokio::test(start_paused = true)]
async fn test_no_url_is_requested_twice() {
    let service = Arc::new(
        MockLabels::new()
            .with_label(&url(2, 0, 0), "a")
            .with_batch_delay(Duration::from_millis(500)),
    );
    let (handle, board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_zoom_changed(0.5);
    for _ in 0..5 {
        handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
        handle.on_tile_drawn(2, 1, 0, drawn(0.125, 0.0));
    }

    // Batch in flight
    settle(Duration::from_millis(200)).await;
    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    handle.on_tile_drawn(2, 1, 0, drawn(0.125, 0.0));

    // Resolved
    settle(Duration::from_secs(1)).await;
    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    handle.on_tile_drawn(2, 1, 0, drawn(0.125, 0.0));
    settle(Duration::from_secs(1)).await;

    assert_eq!(service.times_requested(&url(2, 0, 0)), 1);
    assert_eq!(service.times_requested(&url(2, 1, 0)), 1);
    assert_eq!(board.len(), 1);

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.session.batches_issued, 1);
    assert_eq!(stats.session.cache_hits, 2);
    assert_eq!(stats.session.duplicates_suppressed, 10);
}

// ============================================================================
// Zoom Levels
// ============================================================================

/// After a level change only labelled tiles of the new level are shown, at
/// bounds derived from the tiling.
#[tokio::test(start_paused = true)]
async fn test_zoom_transition_rebuilds_markers() {
    let service = Arc::new(
        MockLabels::new()
            .with_label(&url(2, 1, 1), "two")
            .with_label(&url(3, 2, 2), "three")
            .with_label(&url(3, 3, 2), "three-b"),
    );
    let (handle, board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_zoom_changed(0.5);
    handle.on_tile_drawn(2, 1, 1, drawn(0.125, 0.125));
    handle.on_tile_drawn(3, 2, 2, drawn(0.1, 0.1));
    handle.on_tile_drawn(3, 3, 2, drawn(0.2, 0.1));
    handle.on_tile_drawn(3, 4, 2, drawn(0.3, 0.1));
    settle(Duration::from_millis(200)).await;

    let markers = board.snapshot();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].level(), 2);

    // 0.75 * 4 = 3
    handle.on_zoom_changed(0.75);
    let markers = handle.markers().await.unwrap();
    let shown: Vec<(&str, TileBounds)> = markers.iter().map(|m| (m.label(), m.bounds())).collect();
    assert_eq!(
        shown,
        vec![("three", analytic(3, 2, 2)), ("three-b", analytic(3, 3, 2))]
    );
    assert!(markers.iter().all(|m| m.level() == 3));

    handle.on_zoom_changed(0.5);
    let markers = handle.markers().await.unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].label(), "two");
    assert_eq!(markers[0].bounds(), analytic(2, 1, 1));

    assert_eq!(service.batches().len(), 1, "Zoom changes never trigger lookups");
}

/// Labels arriving for a level that is no longer active are cached but not
/// shown until that level is active again.
#[tokio::test(start_paused = true)]
async fn test_late_labels_for_inactive_level_are_not_shown() {
    let service = Arc::new(
        MockLabels::new()
            .with_label(&url(2, 1, 1), "two")
            .with_batch_delay(Duration::from_millis(500)),
    );
    let (handle, board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_zoom_changed(0.5);
    handle.on_tile_drawn(2, 1, 1, drawn(0.125, 0.125));
    settle(Duration::from_millis(200)).await;
    handle.on_zoom_changed(1.0);
    settle(Duration::from_secs(1)).await;

    assert!(board.is_empty());
    assert_eq!(
        handle.query_label(tile(2, 1, 1)).await.unwrap(),
        LabelState::Label("two".to_string())
    );

    handle.on_zoom_changed(0.5);
    assert_eq!(handle.markers().await.unwrap().len(), 1);
}

// ============================================================================
// Session Lifecycle
// ============================================================================

/// A flush in flight when `stop()` completes never touches state again.
#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_results() {
    let service = Arc::new(
        MockLabels::new()
            .with_label(&url(2, 3, 4), "M31")
            .with_batch_delay(Duration::from_secs(1)),
    );
    let (handle, board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_zoom_changed(0.5);
    handle.on_tile_drawn(2, 3, 4, drawn(0.375, 0.5));
    settle(Duration::from_millis(200)).await;
    assert_eq!(service.batches().len(), 1);

    handle.stop().await.unwrap();
    assert_eq!(handle.status().await.unwrap(), ViewerStatus::Inactive);

    settle(Duration::from_secs(3)).await;
    assert!(board.is_empty());

    handle.start(params()).await.unwrap();
    assert_eq!(
        handle.query_label(tile(2, 3, 4)).await.unwrap(),
        LabelState::Unresolved
    );
    assert!(handle.markers().await.unwrap().is_empty());
}

/// `stop()` cancels the debounce timer.
#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_flush() {
    let service = Arc::new(MockLabels::new());
    let (handle, _board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    handle.stop().await.unwrap();
    settle(Duration::from_secs(1)).await;

    assert!(service.calls().is_empty());
}

/// Starting a new image set replaces the session and its markers.
#[tokio::test(start_paused = true)]
async fn test_start_replaces_previous_session() {
    let service = Arc::new(MockLabels::new().with_label(&url(2, 0, 0), "a"));
    let (handle, board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_zoom_changed(0.5);
    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    settle(Duration::from_millis(200)).await;
    assert_eq!(board.len(), 1);

    let id = handle
        .start(SessionParams::new("m33", MAX_LEVEL, tiling(), TILE_BASE))
        .await
        .unwrap();
    assert_eq!(id.image_set(), "m33");
    assert_eq!(id.generation(), 2);
    assert!(board.is_empty());
    assert_eq!(handle.status().await.unwrap(), ViewerStatus::Opening);
    assert_eq!(handle.stats().await.unwrap().sessions_started, 2);
}

/// `destroy()` from the viewer ends the session.
#[tokio::test(start_paused = true)]
async fn test_destroy_ends_session() {
    let service = Arc::new(MockLabels::new().with_label(&url(2, 0, 0), "a"));
    let (handle, board) = spawn_engine(EngineConfig::default(), service.clone()).await;

    handle.on_zoom_changed(0.5);
    handle.on_tile_drawn(2, 0, 0, drawn(0.0, 0.0));
    settle(Duration::from_millis(200)).await;
    handle.destroy();

    assert_eq!(handle.status().await.unwrap(), ViewerStatus::Inactive);
    assert!(board.is_empty());
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_invalid_tiling_fails_session() {
    let service = Arc::new(MockLabels::new());
    let handle = LabelEngine::spawn(
        EngineConfig::default(),
        service,
        Box::new(MarkerBoard::new()),
    );

    let bad = SessionParams::new(IMAGE_SET, MAX_LEVEL, TilingParameters::new(8192, 0, 256), TILE_BASE);
    let err = handle.start(bad).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::Configuration(ConfigurationError::InvalidField { field: "height", .. })
    ));
    assert!(handle.status().await.unwrap().is_failed());
}

#[tokio::test(start_paused = true)]
async fn test_open_image_uses_metadata() {
    let service = Arc::new(MockLabels::new());
    let handle = LabelEngine::spawn(
        EngineConfig::default(),
        service,
        Box::new(MarkerBoard::new()),
    );

    let metadata = MockMetadata(Ok(ImageInfo {
        max_level: MAX_LEVEL,
        tiling: tiling(),
    }));
    let id = handle
        .open_image(IMAGE_SET, &metadata, TILE_BASE)
        .await
        .unwrap();
    assert_eq!(id.image_set(), IMAGE_SET);
    assert_eq!(handle.status().await.unwrap(), ViewerStatus::Opening);

    let missing = MockMetadata(Err(ConfigurationError::MissingField("tile_size")));
    let err = handle
        .open_image(IMAGE_SET, &missing, TILE_BASE)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));
    assert_eq!(
        handle.status().await.unwrap(),
        ViewerStatus::Failed("Image metadata is missing 'tile_size'".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_viewer_open_failure_is_reported() {
    let service = Arc::new(MockLabels::new());
    let (handle, _board) = spawn_engine(EngineConfig::default(), service).await;

    handle.on_open_failed("unsupported format");

    assert_eq!(
        handle.status().await.unwrap(),
        ViewerStatus::Failed("unsupported format".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_engine() {
    let service = Arc::new(MockLabels::new());
    let (handle, board) = spawn_engine(EngineConfig::default(), service).await;

    handle.shutdown().await;
    settle(Duration::from_millis(10)).await;

    assert!(!handle.is_running());
    assert!(matches!(
        handle.status().await,
        Err(EngineError::Shutdown)
    ));
    assert!(board.is_empty());
}

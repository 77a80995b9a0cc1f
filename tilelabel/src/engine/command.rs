//! Messages into the engine task.

use tokio::sync::oneshot;

use crate::cache::LabelState;
use crate::coordinator::{BatchResolution, FlushBatch};
use crate::error::ConfigurationError;
use crate::overlay::OverlayMarker;
use crate::session::{SessionId, SessionParams};
use crate::stats::EngineStats;
use crate::tile::TileId;
use crate::viewport::{ViewerStatus, ViewportEvent};

/// A request from the shell or the viewer.
#[derive(Debug)]
pub(crate) enum Command {
    Start {
        params: SessionParams,
        reply: oneshot::Sender<Result<SessionId, ConfigurationError>>,
    },
    /// Session initialization failed before reaching the engine.
    Fail { error: ConfigurationError },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Viewport(ViewportEvent),
    QueryLabel {
        tile: TileId,
        reply: oneshot::Sender<LabelState>,
    },
    Markers {
        reply: oneshot::Sender<Vec<OverlayMarker>>,
    },
    Status {
        reply: oneshot::Sender<ViewerStatus>,
    },
    Stats {
        reply: oneshot::Sender<EngineStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// A finished flush reported back by its task.
#[derive(Debug)]
pub(crate) struct FlushCompletion {
    pub session: SessionId,
    pub batch: FlushBatch,
    pub resolution: BatchResolution,
}

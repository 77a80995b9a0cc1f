//! The shell-facing handle to a running engine.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::command::Command;
use crate::cache::LabelState;
use crate::error::EngineError;
use crate::overlay::OverlayMarker;
use crate::service::MetadataSource;
use crate::session::{SessionId, SessionParams};
use crate::stats::EngineStats;
use crate::tile::{TileBounds, TileId};
use crate::viewport::{ViewerStatus, ViewportEvent, ViewportEvents};

/// Cheap, cloneable handle to a [`LabelEngine`](super::LabelEngine).
///
/// Viewport notifications are fire-and-forget. Shell operations wait for the
/// engine to answer and fail with [`EngineError::Shutdown`] once it is gone.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>, shutdown: CancellationToken) -> Self {
        Self { commands, shutdown }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| EngineError::Shutdown)?;
        response.await.map_err(|_| EngineError::Shutdown)
    }

    /// Start a fresh session, discarding any previous one.
    ///
    /// Invalid parameters fail the session: the error is returned and the
    /// status becomes [`ViewerStatus::Failed`].
    pub async fn start(&self, params: SessionParams) -> Result<SessionId, EngineError> {
        let result = self
            .request(|reply| Command::Start { params, reply })
            .await?;
        Ok(result?)
    }

    /// Fetch the tiling of `image_set` from `metadata`, then start a session.
    pub async fn open_image(
        &self,
        image_set: &str,
        metadata: &dyn MetadataSource,
        tile_base_url: &str,
    ) -> Result<SessionId, EngineError> {
        match metadata.image_info(image_set).await {
            Ok(info) => {
                self.start(SessionParams::new(
                    image_set,
                    info.max_level,
                    info.tiling,
                    tile_base_url,
                ))
                .await
            }
            Err(error) => {
                self.commands
                    .send(Command::Fail {
                        error: error.clone(),
                    })
                    .map_err(|_| EngineError::Shutdown)?;
                Err(error.into())
            }
        }
    }

    /// End the live session.
    ///
    /// Returns once the debounce timer is cancelled, in-flight lookups are
    /// abandoned and every marker is removed.
    pub async fn stop(&self) -> Result<(), EngineError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Current cache state for `tile`.
    pub async fn query_label(&self, tile: TileId) -> Result<LabelState, EngineError> {
        self.request(|reply| Command::QueryLabel { tile, reply })
            .await
    }

    /// Markers currently shown, ordered by overlay id.
    pub async fn markers(&self) -> Result<Vec<OverlayMarker>, EngineError> {
        self.request(|reply| Command::Markers { reply }).await
    }

    pub async fn status(&self) -> Result<ViewerStatus, EngineError> {
        self.request(|reply| Command::Status { reply }).await
    }

    pub async fn stats(&self) -> Result<EngineStats, EngineError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Stop the engine task, ending any live session.
    pub async fn shutdown(&self) {
        if self.request(|reply| Command::Shutdown { reply }).await.is_err() {
            self.shutdown.cancel();
        }
    }

    /// Whether the engine task is still running.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Queue a viewport notification.
    pub fn notify(&self, event: ViewportEvent) {
        if self.commands.send(Command::Viewport(event)).is_err() {
            debug!("Viewport event dropped, engine has shut down");
        }
    }
}

impl ViewportEvents for EngineHandle {
    fn on_open(&self) {
        self.notify(ViewportEvent::Open);
    }

    fn on_open_failed(&self, reason: &str) {
        self.notify(ViewportEvent::OpenFailed(reason.to_string()));
    }

    fn on_tile_drawn(&self, level: u32, x: u32, y: u32, bounds: TileBounds) {
        self.notify(ViewportEvent::TileDrawn {
            level,
            x,
            y,
            bounds,
        });
    }

    fn on_zoom_changed(&self, normalized_zoom: f64) {
        self.notify(ViewportEvent::ZoomChanged(normalized_zoom));
    }

    fn destroy(&self) {
        self.notify(ViewportEvent::Destroy);
    }
}

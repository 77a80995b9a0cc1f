//! The engine task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::command::{Command, FlushCompletion};
use super::handle::EngineHandle;
use crate::cache::LabelState;
use crate::config::EngineConfig;
use crate::coordinator::{resolve_batch, EnqueueOutcome};
use crate::error::ConfigurationError;
use crate::overlay::{OverlayRenderer, OverlaySurface};
use crate::service::LabelService;
use crate::session::{LabelSession, SessionId, SessionParams};
use crate::stats::EngineStats;
use crate::viewport::{ViewerStatus, ViewportEvent};

/// Owns the live session and the overlay renderer.
///
/// Commands and viewport events arrive on one channel and are handled one at
/// a time. Lookups run in spawned tasks and report back on a second channel;
/// their results are applied only if the session that issued them is still
/// live.
pub struct LabelEngine {
    config: EngineConfig,
    service: Arc<dyn LabelService>,
    renderer: OverlayRenderer,
    session: Option<LabelSession>,
    /// Cancelled when the live session ends, abandoning its lookups.
    session_token: CancellationToken,
    /// Status reported while no session is live.
    idle_status: ViewerStatus,
    generation: u64,
    stats: EngineStats,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<FlushCompletion>,
    completions_rx: mpsc::UnboundedReceiver<FlushCompletion>,
    shutdown: CancellationToken,
}

impl LabelEngine {
    /// Create an engine and the handle that drives it.
    ///
    /// The engine does nothing until [`LabelEngine::run`] is awaited.
    /// Cancelling `shutdown` stops it.
    ///
    /// # Arguments
    ///
    /// * `config` - Batching and timeout settings
    /// * `service` - Label lookup service
    /// * `surface` - Where overlay markers are drawn
    /// * `shutdown` - Cancellation token for the engine task
    pub fn new(
        config: EngineConfig,
        service: Arc<dyn LabelService>,
        surface: Box<dyn OverlaySurface>,
        shutdown: CancellationToken,
    ) -> (Self, EngineHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let engine = Self {
            config,
            service,
            renderer: OverlayRenderer::new(surface),
            session: None,
            session_token: shutdown.child_token(),
            idle_status: ViewerStatus::Inactive,
            generation: 0,
            stats: EngineStats::default(),
            commands,
            completions_tx,
            completions_rx,
            shutdown: shutdown.clone(),
        };

        (engine, EngineHandle::new(command_tx, shutdown))
    }

    /// Create an engine and run it on the current tokio runtime.
    pub fn spawn(
        config: EngineConfig,
        service: Arc<dyn LabelService>,
        surface: Box<dyn OverlaySurface>,
    ) -> EngineHandle {
        let (engine, handle) = Self::new(config, service, surface, CancellationToken::new());
        tokio::spawn(engine.run());
        handle
    }

    /// Run until shut down.
    pub async fn run(mut self) {
        info!(
            debounce_ms = self.config.debounce.as_millis() as u64,
            threshold = self.config.batch_threshold,
            "Label engine starting"
        );

        loop {
            let deadline = self.session.as_ref().and_then(LabelSession::deadline);

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    break;
                }

                Some(completion) = self.completions_rx.recv() => {
                    self.handle_completion(completion);
                }

                command = self.commands.recv() => {
                    match command {
                        Some(Command::Shutdown { reply }) => {
                            let _ = reply.send(());
                            break;
                        }
                        Some(command) => self.handle_command(command),
                        // Every handle is gone
                        None => break,
                    }
                }

                _ = sleep_until(deadline) => {
                    self.flush();
                }
            }
        }

        self.end_session(ViewerStatus::Inactive);
        self.shutdown.cancel();
        info!(stats = %self.stats, "Label engine stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { params, reply } => {
                let _ = reply.send(self.start(params));
            }
            Command::Fail { error } => {
                warn!(error = %error, "Viewer cannot be initialized");
                self.end_session(ViewerStatus::Failed(error.to_string()));
            }
            Command::Stop { reply } => {
                self.end_session(ViewerStatus::Inactive);
                let _ = reply.send(());
            }
            Command::Viewport(event) => self.handle_viewport(event),
            Command::QueryLabel { tile, reply } => {
                let state = match &self.session {
                    Some(session) => session.query_label(&tile),
                    None => LabelState::Unresolved,
                };
                let _ = reply.send(state);
            }
            Command::Markers { reply } => {
                let _ = reply.send(self.renderer.snapshot());
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.current_stats());
            }
            // Handled by the run loop
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn start(&mut self, params: SessionParams) -> Result<SessionId, ConfigurationError> {
        if let Err(e) = params.validate() {
            warn!(image_set = %params.image_set, error = %e, "Rejected image configuration");
            self.end_session(ViewerStatus::Failed(e.to_string()));
            return Err(e);
        }

        self.end_session(ViewerStatus::Inactive);
        self.generation += 1;
        self.stats.sessions_started += 1;
        self.session_token = self.shutdown.child_token();

        let id = SessionId::new(self.generation, params.image_set.as_str());
        info!(
            session = %id,
            max_level = params.max_level,
            width = params.tiling.width,
            height = params.tiling.height,
            tile_size = params.tiling.tile_size,
            "Label session started"
        );
        self.session = Some(LabelSession::new(
            id.clone(),
            params,
            self.config.batch_policy(),
        ));
        Ok(id)
    }

    /// Tear down the live session, if any, and report `status` afterwards.
    fn end_session(&mut self, status: ViewerStatus) {
        self.session_token.cancel();
        if let Some(session) = self.session.take() {
            let id = session.id().clone();
            let stats = session.teardown(&mut self.renderer);
            info!(
                session = %id,
                batches = stats.batches_issued,
                labels = stats.labels_resolved,
                "Label session ended"
            );
        }
        self.idle_status = status;
    }

    fn handle_viewport(&mut self, event: ViewportEvent) {
        if matches!(event, ViewportEvent::Destroy) {
            self.end_session(ViewerStatus::Inactive);
            return;
        }

        let Some(session) = self.session.as_mut() else {
            debug!(event = ?event, "Viewport event without a session");
            return;
        };

        match event {
            ViewportEvent::Open => {
                debug!(session = %session.id(), "Viewer opened image");
                session.on_open();
            }
            ViewportEvent::OpenFailed(reason) => {
                warn!(session = %session.id(), reason = %reason, "Viewer failed to open image");
                self.end_session(ViewerStatus::Failed(reason));
            }
            ViewportEvent::TileDrawn {
                level,
                x,
                y,
                bounds,
            } => {
                let outcome =
                    session.on_tile_drawn(&mut self.renderer, level, x, y, bounds, Instant::now());
                if matches!(outcome, Some(EnqueueOutcome::ThresholdReached)) {
                    self.flush();
                }
            }
            ViewportEvent::ZoomChanged(zoom) => {
                session.on_zoom_changed(&mut self.renderer, zoom);
            }
            ViewportEvent::Destroy => {}
        }
    }

    /// Hand the pending requests of the live session to a lookup task.
    fn flush(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(batch) = session.begin_flush() else {
            return;
        };

        let id = session.id().clone();
        let service = Arc::clone(&self.service);
        let timeout = self.config.lookup_timeout;
        let token = self.session_token.clone();
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let urls = batch.urls();
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(session = %id, batch = batch.id(), "Lookup abandoned");
                }
                resolution = resolve_batch(service.as_ref(), &urls, timeout) => {
                    let _ = completions.send(FlushCompletion {
                        session: id,
                        batch,
                        resolution,
                    });
                }
            }
        });
    }

    fn handle_completion(&mut self, completion: FlushCompletion) {
        let FlushCompletion {
            session: id,
            batch,
            resolution,
        } = completion;

        match self.session.as_mut() {
            Some(session) if *session.id() == id => {
                session.complete_flush(&mut self.renderer, batch, resolution, Instant::now());
            }
            _ => {
                self.stats.stale_completions += 1;
                debug!(session = %id, batch = batch.id(), "Discarding result of ended session");
            }
        }
    }

    fn status(&self) -> ViewerStatus {
        match &self.session {
            Some(session) => session.status().clone(),
            None => self.idle_status.clone(),
        }
    }

    fn current_stats(&self) -> EngineStats {
        match &self.session {
            Some(session) => EngineStats {
                session: session.stats(),
                pending_requests: session.coordinator().pending_len(),
                in_flight_requests: session.coordinator().in_flight_len(),
                ..self.stats
            },
            None => self.stats,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

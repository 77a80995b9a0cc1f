//! `tilelabel replay`: drive a label engine from a script of viewer events.
//!
//! A script stands in for the viewer. Each line is one event:
//!
//! ```text
//! # comments and blank lines are skipped
//! open
//! zoom 0.5
//! draw 2 1 3
//! wait 250
//! destroy
//! ```
//!
//! `fail <reason>` reports that the viewer could not open the image. `wait`
//! advances real time so debounce flushes happen as they would on screen.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tilelabel::config::ConfigFile;
use tilelabel::overlay::{MarkerBoard, OverlayId, OverlayMarker, OverlaySurface};
use tilelabel::service::{HttpMetadataSource, ImageInfo, MetadataSource};
use tilelabel::session::SessionParams;
use tilelabel::tile::TilingParameters;
use tilelabel::{EngineHandle, LabelEngine, ViewportEvents};
use tracing::{debug, info};

use super::common::{ServiceArgs, Services};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Upper bound on how long to wait for outstanding lookups after the script.
const DRAIN_LIMIT: Duration = Duration::from_secs(60);

/// Arguments for `replay`.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Script of viewer events
    pub script: PathBuf,

    /// Image set to open
    #[arg(long)]
    pub image_set: String,

    /// Image width in pixels (skips the metadata service)
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Tile edge length in pixels
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Deepest pyramid level
    #[arg(long)]
    pub max_level: Option<u32>,

    /// Debounce delay in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Pending requests that trigger an immediate flush
    #[arg(long)]
    pub threshold: Option<usize>,

    #[command(flatten)]
    pub service: ServiceArgs,
}

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Open,
    Fail(String),
    Draw { level: u32, x: u32, y: u32 },
    Zoom(f64),
    Wait(Duration),
    Destroy,
}

/// Parse a replay script.
///
/// Line numbers in errors are 1-based.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, CliError> {
    let mut steps = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let error = |reason: String| CliError::Script {
            line: index + 1,
            reason,
        };

        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));
        let args: Vec<&str> = rest.split_whitespace().collect();

        let step = match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("open", []) => ScriptStep::Open,
            ("destroy", []) => ScriptStep::Destroy,
            ("fail", _) if !rest.is_empty() => ScriptStep::Fail(rest.to_string()),
            ("fail", _) => return Err(error("fail needs a reason".to_string())),
            ("draw", [level, x, y]) => {
                let number = |name: &str, value: &str| {
                    value
                        .parse::<u32>()
                        .map_err(|_| error(format!("{} '{}' is not a tile coordinate", name, value)))
                };
                ScriptStep::Draw {
                    level: number("level", level)?,
                    x: number("x", x)?,
                    y: number("y", y)?,
                }
            }
            ("zoom", [value]) => {
                let zoom = value
                    .parse::<f64>()
                    .map_err(|_| error(format!("zoom '{}' is not a number", value)))?;
                ScriptStep::Zoom(zoom)
            }
            ("wait", [value]) => {
                let millis = value
                    .parse::<u64>()
                    .map_err(|_| error(format!("wait '{}' is not a number of milliseconds", value)))?;
                ScriptStep::Wait(Duration::from_millis(millis))
            }
            ("open" | "destroy" | "draw" | "zoom" | "wait", _) => {
                return Err(error(format!("wrong number of arguments to '{}'", command)))
            }
            _ => return Err(error(format!("unknown command '{}'", command))),
        };
        steps.push(step);
    }

    Ok(steps)
}

/// Surface that logs marker mutations and mirrors them to a board.
struct ConsoleSurface {
    board: MarkerBoard,
}

impl OverlaySurface for ConsoleSurface {
    fn create(&mut self, marker: &OverlayMarker) {
        info!(marker = %marker.id(), label = marker.label(), "Marker created");
        self.board.create(marker);
    }

    fn update(&mut self, marker: &OverlayMarker) {
        info!(marker = %marker.id(), label = marker.label(), "Marker updated");
        self.board.update(marker);
    }

    fn remove(&mut self, id: &OverlayId) {
        debug!(marker = %id, "Marker removed");
        self.board.remove(id);
    }
}

/// Tiling from the command line, if all four values were given.
fn explicit_image_info(args: &ReplayArgs) -> Result<Option<ImageInfo>, CliError> {
    match (args.width, args.height, args.tile_size, args.max_level) {
        (Some(width), Some(height), Some(tile_size), Some(max_level)) => Ok(Some(ImageInfo {
            max_level,
            tiling: TilingParameters::new(width, height, tile_size),
        })),
        (None, None, None, None) => Ok(None),
        _ => Err(CliError::Config(
            "--width, --height, --tile-size and --max-level must be given together".to_string(),
        )),
    }
}

async fn image_info(args: &ReplayArgs, services: &Services) -> Result<ImageInfo, CliError> {
    if let Some(info) = explicit_image_info(args)? {
        return Ok(info);
    }
    let metadata =
        HttpMetadataSource::new(&services.metadata_url, services.timeout).map_err(CliError::Image)?;
    metadata
        .image_info(&args.image_set)
        .await
        .map_err(CliError::Image)
}

/// Run a replay script against the label service.
pub async fn run(args: ReplayArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("replay");

    let text = std::fs::read_to_string(&args.script).map_err(|error| CliError::ScriptRead {
        path: args.script.display().to_string(),
        error,
    })?;
    let steps = parse_script(&text)?;

    let config = runner.config();
    let services = args.service.resolve(config);
    let engine_config = engine_config(&args, config, services.timeout);
    let debounce = engine_config.debounce;
    let info = image_info(&args, &services).await?;

    let board = MarkerBoard::new();
    let handle = LabelEngine::spawn(
        engine_config,
        Arc::new(services.label_service()?),
        Box::new(ConsoleSurface {
            board: board.clone(),
        }),
    );

    let session = handle
        .start(SessionParams::new(
            args.image_set.as_str(),
            info.max_level,
            info.tiling,
            services.tile_url.as_str(),
        ))
        .await?;
    println!("Session {} ({} steps)", session, steps.len());

    for step in &steps {
        play(&handle, &info, step).await;
    }
    drain(&handle, debounce).await?;

    let status = handle.status().await?;
    let stats = handle.stats().await?;
    handle.shutdown().await;

    println!();
    println!("Viewer: {}", status);
    println!("Markers ({}):", board.len());
    for marker in board.snapshot() {
        let b = marker.bounds();
        println!(
            "  {:<12} {:<24} at ({:.0}, {:.0}) {:.0}x{:.0}",
            marker.id().to_string(),
            marker.label(),
            b.x,
            b.y,
            b.width,
            b.height
        );
    }
    println!("Stats: {}", stats);
    Ok(())
}

fn engine_config(
    args: &ReplayArgs,
    config: &ConfigFile,
    timeout: Duration,
) -> tilelabel::config::EngineConfig {
    let mut engine_config = config.engine_config().with_lookup_timeout(timeout);
    if let Some(ms) = args.debounce_ms {
        engine_config = engine_config.with_debounce(Duration::from_millis(ms));
    }
    if let Some(threshold) = args.threshold {
        engine_config = engine_config.with_batch_threshold(threshold);
    }
    engine_config
}

async fn play(handle: &EngineHandle, info: &ImageInfo, step: &ScriptStep) {
    debug!(step = ?step, "Replaying");
    match step {
        ScriptStep::Open => handle.on_open(),
        ScriptStep::Fail(reason) => handle.on_open_failed(reason),
        ScriptStep::Draw { level, x, y } => {
            // Tiles outside the pyramid still reach the engine, which ignores them
            let bounds = info
                .tiling
                .tile_bounds(*level, *x, *y, info.max_level)
                .unwrap_or_default();
            handle.on_tile_drawn(*level, *x, *y, bounds);
        }
        ScriptStep::Zoom(zoom) => handle.on_zoom_changed(*zoom),
        ScriptStep::Wait(duration) => tokio::time::sleep(*duration).await,
        ScriptStep::Destroy => handle.destroy(),
    }
}

/// Wait until no lookups are queued or running.
async fn drain(handle: &EngineHandle, debounce: Duration) -> Result<(), CliError> {
    let poll = debounce.max(Duration::from_millis(10));
    let started = tokio::time::Instant::now();

    loop {
        let stats = handle.stats().await?;
        if stats.is_idle() {
            return Ok(());
        }
        if started.elapsed() >= DRAIN_LIMIT {
            info!(
                pending = stats.pending_requests,
                in_flight = stats.in_flight_requests,
                "Giving up on outstanding lookups"
            );
            return Ok(());
        }
        tokio::time::sleep(poll).await;
    }
}

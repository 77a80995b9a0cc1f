//! `tilelabel lookup`: resolve labels for a few tiles once.

use clap::Args;
use tilelabel::coordinator::{resolve_batch, LookupPath};
use tilelabel::tile::TileId;
use tracing::info;

use super::common::{parse_tile_spec, ServiceArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `lookup`.
#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Image set the tiles belong to
    #[arg(long)]
    pub image_set: String,

    /// Tiles as level/x/y
    #[arg(required = true, value_parser = parse_tile_spec)]
    pub tiles: Vec<(u32, u32, u32)>,

    #[command(flatten)]
    pub service: ServiceArgs,
}

/// Look the tiles up with one batch, falling back to single lookups.
pub async fn run(args: LookupArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("lookup");
    let services = args.service.resolve(runner.config());
    let service = services.label_service()?;

    let tiles: Vec<TileId> = args
        .tiles
        .iter()
        .map(|&(level, x, y)| TileId::new(args.image_set.as_str(), level, x, y))
        .collect();
    let urls: Vec<String> = tiles
        .iter()
        .map(|tile| tile.absolute_url(&services.tile_url))
        .collect();

    info!(count = urls.len(), label_url = %services.label_url, "Looking up labels");
    let resolution = resolve_batch(&service, &urls, services.timeout).await;

    for (tile, url) in tiles.iter().zip(&urls) {
        let label = resolution.labels.get(url).cloned().flatten();
        println!("{:<24} {}", tile.to_string(), label.as_deref().unwrap_or("(no label)"));
    }

    if let LookupPath::Fallback { lookups, failures } = resolution.path {
        println!();
        println!(
            "Batch lookup failed; {} single lookups, {} failed",
            lookups, failures
        );
    }
    Ok(())
}

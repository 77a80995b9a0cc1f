//! Tile identity and geometry.
//!
//! A [`TileId`] names one tile of an image pyramid and derives the absolute
//! url the label service keys its answers by. [`TilingParameters`] describe
//! the pyramid well enough to recompute any tile's bounds without the draw
//! event that originally reported it.

mod id;
mod tiling;

pub use id::TileId;
pub use tiling::{TileBounds, TilingParameters, MAX_SUPPORTED_LEVEL};

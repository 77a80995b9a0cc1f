//! Structured tile identifiers and their cache keys.

use std::fmt;
use std::sync::Arc;

/// Identity of one tile within an image pyramid.
///
/// Identity is structural: two ids with the same image set, level and grid
/// position are the same tile. The image set name is shared behind an `Arc`
/// so ids can be cloned freely between the cache, the pending set and the
/// overlay renderer.
///
/// # Example
///
/// ```
/// use tilelabel::tile::TileId;
///
/// let tile = TileId::new("andromeda", 2, 3, 4);
/// assert_eq!(tile.level(), 2);
/// assert_eq!(
///     tile.absolute_url("http://localhost:8000"),
///     "http://localhost:8000/tiles/andromeda/2/3/4.png"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    image_set: Arc<str>,
    level: u32,
    x: u32,
    y: u32,
}

impl TileId {
    /// Create a tile id.
    ///
    /// # Arguments
    ///
    /// * `image_set` - Name of the tiled image
    /// * `level` - Pyramid level (0 is the most zoomed-out level)
    /// * `x` - Tile column within the level
    /// * `y` - Tile row within the level
    pub fn new(image_set: impl Into<Arc<str>>, level: u32, x: u32, y: u32) -> Self {
        Self {
            image_set: image_set.into(),
            level,
            x,
            y,
        }
    }

    /// Name of the image set this tile belongs to.
    pub fn image_set(&self) -> &str {
        &self.image_set
    }

    /// Pyramid level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Tile column.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Tile row.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// The absolute url of this tile on the tile server.
    ///
    /// This string is the key the label service knows tiles by, so it must be
    /// stable for the lifetime of a session. A trailing slash on `base_url`
    /// is ignored.
    pub fn absolute_url(&self, base_url: &str) -> String {
        format!(
            "{}/tiles/{}/{}/{}/{}.png",
            base_url.trim_end_matches('/'),
            self.image_set,
            self.level,
            self.x,
            self.y
        )
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.image_set, self.level, self.x, self.y)
    }
}

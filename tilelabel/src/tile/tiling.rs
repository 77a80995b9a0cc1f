//! Static tiling parameters and analytic tile bounds.
//!
//! Tiles are cut from a pyramid where level `max_level` is the full-resolution
//! image and every level below halves both dimensions. Level `L` is therefore
//! the full image scaled down by `2^(max_level - L)`, cut into square tiles of
//! `tile_size` pixels starting at the top-left corner. The last column and row
//! of a level may be narrower than `tile_size`.
//!
//! Bounds are expressed in full-resolution image pixels, which is the space
//! overlay markers are positioned in.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Deepest pyramid level the engine accepts.
pub const MAX_SUPPORTED_LEVEL: u32 = 30;

/// Axis-aligned rectangle in full-resolution image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TileBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TileBounds {
    /// Create a rectangle from its top-left corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}

/// Dimensions of the full-resolution image and its tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilingParameters {
    /// Full-resolution width in pixels.
    pub width: u32,
    /// Full-resolution height in pixels.
    pub height: u32,
    /// Edge length of a square tile in pixels.
    pub tile_size: u32,
}

impl TilingParameters {
    /// Create tiling parameters. Call [`validate`](Self::validate) before use.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        Self {
            width,
            height,
            tile_size,
        }
    }

    /// Check that these parameters can address tiles up to `max_level`.
    pub fn validate(&self, max_level: u32) -> Result<(), ConfigurationError> {
        if self.width == 0 {
            return Err(invalid("width", self.width, "must be greater than zero"));
        }
        if self.height == 0 {
            return Err(invalid("height", self.height, "must be greater than zero"));
        }
        if self.tile_size == 0 {
            return Err(invalid(
                "tile_size",
                self.tile_size,
                "must be greater than zero",
            ));
        }
        if max_level > MAX_SUPPORTED_LEVEL {
            return Err(invalid(
                "max_level",
                max_level,
                &format!("must not exceed {}", MAX_SUPPORTED_LEVEL),
            ));
        }
        Ok(())
    }

    /// Downscale factor of `level` relative to the full-resolution image.
    fn scale(level: u32, max_level: u32) -> f64 {
        2f64.powi((max_level - level) as i32)
    }

    /// Pixel dimensions of the image at `level`.
    ///
    /// Returns `None` for levels deeper than `max_level`.
    pub fn level_dimensions(&self, level: u32, max_level: u32) -> Option<(u64, u64)> {
        if level > max_level {
            return None;
        }
        let scale = Self::scale(level, max_level);
        let w = (self.width as f64 / scale).ceil() as u64;
        let h = (self.height as f64 / scale).ceil() as u64;
        Some((w.max(1), h.max(1)))
    }

    /// Number of tile columns and rows at `level`.
    pub fn grid_size(&self, level: u32, max_level: u32) -> Option<(u64, u64)> {
        if self.tile_size == 0 {
            return None;
        }
        let (w, h) = self.level_dimensions(level, max_level)?;
        let ts = self.tile_size as u64;
        Some((w.div_ceil(ts), h.div_ceil(ts)))
    }

    /// Bounds of tile `(level, x, y)` in full-resolution pixels.
    ///
    /// Returns `None` when the tile does not exist in this pyramid.
    pub fn tile_bounds(&self, level: u32, x: u32, y: u32, max_level: u32) -> Option<TileBounds> {
        let (cols, rows) = self.grid_size(level, max_level)?;
        if x as u64 >= cols || y as u64 >= rows {
            return None;
        }

        let (level_w, level_h) = self.level_dimensions(level, max_level)?;
        let ts = self.tile_size as u64;
        let left = x as u64 * ts;
        let top = y as u64 * ts;
        let right = (left + ts).min(level_w);
        let bottom = (top + ts).min(level_h);

        let scale = Self::scale(level, max_level);
        let x0 = left as f64 * scale;
        let y0 = top as f64 * scale;
        let x1 = (right as f64 * scale).min(self.width as f64);
        let y1 = (bottom as f64 * scale).min(self.height as f64);

        Some(TileBounds::new(x0, y0, x1 - x0, y1 - y0))
    }
}

fn invalid(field: &'static str, value: u32, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidField {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TilingParameters {
        // 1000×600 image, 256px tiles, 4 levels below full resolution
        TilingParameters::new(1000, 600, 256)
    }

    #[test]
    fn test_validate_accepts_reasonable_parameters() {
        assert!(params().validate(4).is_ok());
        assert!(params().validate(0).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_fields() {
        let err = TilingParameters::new(0, 600, 256).validate(4).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidField { field: "width", .. }
        ));

        let err = TilingParameters::new(1000, 600, 0).validate(4).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidField {
                field: "tile_size",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_excessive_max_level() {
        let err = params().validate(MAX_SUPPORTED_LEVEL + 1).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidField {
                field: "max_level",
                ..
            }
        ));
    }

    #[test]
    fn test_level_dimensions_halve_per_level() {
        let p = params();
        assert_eq!(p.level_dimensions(4, 4), Some((1000, 600)));
        assert_eq!(p.level_dimensions(3, 4), Some((500, 300)));
        assert_eq!(p.level_dimensions(2, 4), Some((250, 150)));
        assert_eq!(p.level_dimensions(0, 4), Some((63, 38)));
        assert_eq!(p.level_dimensions(5, 4), None);
    }

    #[test]
    fn test_grid_size() {
        let p = params();
        assert_eq!(p.grid_size(4, 4), Some((4, 3)));
        assert_eq!(p.grid_size(3, 4), Some((2, 2)));
        assert_eq!(p.grid_size(2, 4), Some((1, 1)));
    }

    #[test]
    fn test_full_resolution_tile_bounds() {
        let p = params();
        let b = p.tile_bounds(4, 1, 0, 4).unwrap();
        assert_eq!(b, TileBounds::new(256.0, 0.0, 256.0, 256.0));

        // Last column is clipped to the image width
        let b = p.tile_bounds(4, 3, 2, 4).unwrap();
        assert_eq!(b, TileBounds::new(768.0, 512.0, 232.0, 88.0));
    }

    #[test]
    fn test_downscaled_tile_bounds_cover_scaled_area() {
        let p = params();
        // Level 3 is half size: tile (1, 0) covers level pixels 256..500
        let b = p.tile_bounds(3, 1, 0, 4).unwrap();
        assert_eq!(b.x, 512.0);
        assert_eq!(b.y, 0.0);
        assert_eq!(b.max_x(), 1000.0);
        assert_eq!(b.max_y(), 512.0);
    }

    #[test]
    fn test_out_of_grid_tiles_are_unresolvable() {
        let p = params();
        assert!(p.tile_bounds(3, 2, 0, 4).is_none());
        assert!(p.tile_bounds(2, 0, 1, 4).is_none());
        assert!(p.tile_bounds(5, 0, 0, 4).is_none());
    }
}

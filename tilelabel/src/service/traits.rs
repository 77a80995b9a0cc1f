//! Service interfaces consumed by the engine.
//!
//! Both traits are dyn-compatible: async methods return boxed futures so the
//! engine can hold an `Arc<dyn LabelService>` and move clones of it into
//! spawned flush tasks.

use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::error::{ConfigurationError, LookupError};
use crate::tile::TilingParameters;

/// Remote label-lookup service.
///
/// # Contract
///
/// - A batch response maps urls to labels. Urls without a label are simply
///   absent; absence is not an error.
/// - A single lookup answers `Ok(None)` when the service has no label.
/// - Any failure to obtain an answer is a [`LookupError`]. Callers apply
///   their own timeouts on top of whatever the implementation enforces.
pub trait LabelService: Send + Sync {
    /// Look up labels for every url in one call.
    fn lookup_batch<'a>(
        &'a self,
        urls: &'a [String],
    ) -> BoxFuture<'a, Result<HashMap<String, String>, LookupError>>;

    /// Look up the label of a single url.
    fn lookup_one<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<String>, LookupError>>;
}

/// Static description of a tiled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    /// Deepest pyramid level (full resolution).
    pub max_level: u32,
    /// Pyramid geometry.
    pub tiling: TilingParameters,
}

/// Remote image-metadata service supplying tiling parameters.
pub trait MetadataSource: Send + Sync {
    /// Fetch and validate the tiling parameters of `image_set`.
    fn image_info<'a>(&'a self, image_set: &'a str) -> BoxFuture<'a, Result<ImageInfo, ConfigurationError>>;
}

//! Remote services: label lookups and image metadata.
//!
//! The engine only sees the [`LabelService`] and [`MetadataSource`] traits.
//! [`HttpLabelService`] and [`HttpMetadataSource`] are the production
//! implementations built on `reqwest`.

mod http;
mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use http::{
    decode_batch, decode_single, HttpLabelService, HttpMetadataSource, ImageInfoResponse,
    DEFAULT_HTTP_TIMEOUT,
};
pub use traits::{ImageInfo, LabelService, MetadataSource};

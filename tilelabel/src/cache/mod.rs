//! Label cache.
//!
//! Maps a tile's absolute url to the label the service returned for it, or to
//! an explicit negative result. One cache belongs to one viewer session and
//! is discarded with it.

mod label;

pub use label::{LabelCache, LabelState};

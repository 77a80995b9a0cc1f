//! Session-scoped store of resolved tile labels.

use std::collections::HashMap;

use tracing::warn;

use crate::tile::TileId;

/// What the cache knows about one tile url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelState {
    /// Never resolved in this session.
    Unresolved,
    /// The service returned this non-empty label.
    Label(String),
    /// The service has no label for the tile, or the lookup failed.
    NoLabel,
}

impl LabelState {
    /// Whether the url has been resolved either way.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, LabelState::Unresolved)
    }

    /// The label text, if there is one.
    pub fn label(&self) -> Option<&str> {
        match self {
            LabelState::Label(text) => Some(text),
            _ => None,
        }
    }
}

/// A resolved entry. The structured tile id is kept next to the value so
/// level scans never need to parse the url key.
#[derive(Debug, Clone)]
struct CacheEntry {
    tile: TileId,
    label: Option<String>,
}

/// Map from absolute tile url to resolved label.
///
/// Only resolved urls are stored; anything absent is [`LabelState::Unresolved`].
/// Entries move from unresolved to resolved once and are never reset except
/// by [`clear`](Self::clear) when the session ends.
#[derive(Debug, Default)]
pub struct LabelCache {
    entries: HashMap<String, CacheEntry>,
}

impl LabelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `url`.
    pub fn get(&self, url: &str) -> LabelState {
        match self.entries.get(url) {
            None => LabelState::Unresolved,
            Some(CacheEntry {
                label: Some(text), ..
            }) => LabelState::Label(text.clone()),
            Some(CacheEntry { label: None, .. }) => LabelState::NoLabel,
        }
    }

    /// Whether `url` has been resolved.
    pub fn is_resolved(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Record the outcome of a lookup for `tile`.
    ///
    /// `None` and empty strings are stored as [`LabelState::NoLabel`]. Returns
    /// `true` if this write resolved the url; a second write for the same url
    /// replaces the first and is reported as a warning.
    pub fn set(&mut self, tile: &TileId, url: &str, label: Option<String>) -> bool {
        let label = label.filter(|text| !text.is_empty());
        let entry = CacheEntry {
            tile: tile.clone(),
            label,
        };

        match self.entries.insert(url.to_string(), entry) {
            None => true,
            Some(_) => {
                warn!(url = %url, "Label cache entry overwritten");
                false
            }
        }
    }

    /// Iterate over tiles at `level` that carry a label.
    pub fn labels_at_level(&self, level: u32) -> impl Iterator<Item = (&TileId, &str)> + '_ {
        self.entries.values().filter_map(move |entry| {
            match (&entry.label, entry.tile.level() == level) {
                (Some(text), true) => Some((&entry.tile, text.as_str())),
                _ => None,
            }
        })
    }

    /// Number of resolved urls.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

//! Engine tuning.

use std::time::Duration;

use crate::coordinator::{BatchPolicy, DEFAULT_BATCH_THRESHOLD, DEFAULT_DEBOUNCE};
use crate::service::DEFAULT_HTTP_TIMEOUT;

/// Batching and timeout settings for a [`LabelEngine`](crate::engine::LabelEngine).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet period after the last tile-drawn event before a flush.
    pub debounce: Duration,
    /// Pending count that flushes immediately.
    pub batch_threshold: usize,
    /// Upper bound on every batched and single lookup.
    pub lookup_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            lookup_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl EngineConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the flush threshold. Zero is treated as one.
    pub fn with_batch_threshold(mut self, threshold: usize) -> Self {
        self.batch_threshold = threshold.max(1);
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// The coordinator policy these settings describe.
    pub fn batch_policy(&self) -> BatchPolicy {
        BatchPolicy {
            debounce: self.debounce,
            threshold: self.batch_threshold,
        }
    }
}

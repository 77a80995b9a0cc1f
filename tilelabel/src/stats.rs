//! Counters describing label traffic.

use std::fmt;

/// Counters for one viewer session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Tile-drawn events answered straight from the cache.
    pub cache_hits: u64,
    /// Enqueues dropped because the url was already pending or in flight.
    pub duplicates_suppressed: u64,
    /// Pending urls dropped at flush time because another flush resolved them.
    pub rechecked_dropped: u64,
    /// Batched lookups sent.
    pub batches_issued: u64,
    /// Batched lookups that failed and fell back to single lookups.
    pub batch_failures: u64,
    /// Single lookups sent on the fallback path.
    pub fallback_lookups: u64,
    /// Urls resolved to a label.
    pub labels_resolved: u64,
    /// Urls resolved to "no label", including failed lookups.
    pub labels_missing: u64,
}

impl SessionStats {
    /// Total number of urls resolved either way.
    pub fn urls_resolved(&self) -> u64 {
        self.labels_resolved + self.labels_missing
    }
}

/// Counters for the engine as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Counters of the live session, zero when no session is active.
    pub session: SessionStats,
    /// Sessions started since the engine was spawned.
    pub sessions_started: u64,
    /// Flush results discarded because their session had ended.
    pub stale_completions: u64,
    /// Urls waiting for the next flush.
    pub pending_requests: usize,
    /// Urls in batches that have not completed.
    pub in_flight_requests: usize,
}

impl EngineStats {
    /// Whether no lookups are queued or running.
    pub fn is_idle(&self) -> bool {
        self.pending_requests == 0 && self.in_flight_requests == 0
    }
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.session;
        write!(
            f,
            "{} batches ({} failed, {} fallback lookups), {} labels, {} without label, \
             {} cache hits, {} duplicates, {} stale results",
            s.batches_issued,
            s.batch_failures,
            s.fallback_lookups,
            s.labels_resolved,
            s.labels_missing,
            s.cache_hits,
            s.duplicates_suppressed,
            self.stale_completions
        )
    }
}

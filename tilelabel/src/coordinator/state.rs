//! The request coordinator state machine.
//!
//! ```text
//!            enqueue                      threshold / deadline
//!   Idle ──────────────► Accumulating ─────────────────────► Flushing
//!    ▲                     ▲    │ enqueue (timer restarts)      │
//!    │                     │    └──────────┘                    │
//!    │                     └──── complete, pending not empty ───┤
//!    └────────────── complete, nothing pending or in flight ────┘
//! ```
//!
//! The coordinator is synchronous and clock-agnostic: callers pass `now` in
//! and poll [`RequestCoordinator::deadline`] to know when the debounce timer
//! expires. The asynchronous lookup itself lives in [`super::lookup`].

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::{LabelCache, LabelState};
use crate::stats::SessionStats;
use crate::tile::{TileBounds, TileId};

/// Default quiet period before pending requests are flushed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default pending count that triggers an immediate flush.
pub const DEFAULT_BATCH_THRESHOLD: usize = 10;

/// When to turn pending requests into a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Quiet period after the last enqueue.
    pub debounce: Duration,
    /// Pending count that flushes immediately. Values below 1 act as 1.
    pub threshold: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            threshold: DEFAULT_BATCH_THRESHOLD,
        }
    }
}

/// Coordinator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Nothing pending and nothing in flight.
    Idle,
    /// Requests are pending and the debounce timer is running.
    Accumulating,
    /// At least one batch is in flight and nothing is pending.
    Flushing,
}

/// A tile waiting to be included in the next batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub tile: TileId,
    pub url: String,
    /// Bounds reported by the draw event, when there was one.
    pub bounds: Option<TileBounds>,
}

impl PendingRequest {
    pub fn new(tile: TileId, url: String, bounds: Option<TileBounds>) -> Self {
        Self { tile, url, bounds }
    }
}

/// What [`RequestCoordinator::enqueue`] did with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
    /// The cache already holds an answer; nothing was queued.
    Resolved(LabelState),
    /// The url is already pending or in flight.
    AlreadyQueued,
    /// Queued; flush when `deadline` passes without further enqueues.
    Queued { deadline: Instant },
    /// Queued and the threshold was reached; flush now.
    ThresholdReached,
}

/// A set of requests handed to one lookup.
#[derive(Debug, Clone)]
pub struct FlushBatch {
    id: u64,
    requests: Vec<PendingRequest>,
}

impl FlushBatch {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn requests(&self) -> &[PendingRequest] {
        &self.requests
    }

    /// Urls to send, in enqueue order.
    pub fn urls(&self) -> Vec<String> {
        self.requests.iter().map(|r| r.url.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// How a batch was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPath {
    /// The batched call succeeded.
    Batched,
    /// The batched call failed and every url was looked up on its own.
    Fallback {
        /// Single lookups issued.
        lookups: usize,
        /// Single lookups that failed and were recorded as "no label".
        failures: usize,
    },
}

/// Outcome of resolving one batch: an answer for every requested url.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResolution {
    pub labels: HashMap<String, Option<String>>,
    pub path: LookupPath,
}

/// A tile whose lookup completed, ready to hand to the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTile {
    pub tile: TileId,
    pub bounds: Option<TileBounds>,
    pub label: Option<String>,
}

/// Accumulates tiles that need labels and decides when to flush them.
///
/// Guarantees that a url is handed to at most one batch per session: urls are
/// deduplicated against the pending set and the in-flight set at enqueue
/// time, and re-checked against the cache when a batch is assembled.
#[derive(Debug)]
pub struct RequestCoordinator {
    policy: BatchPolicy,
    state: CoordinatorState,
    pending: Vec<PendingRequest>,
    pending_urls: HashSet<String>,
    in_flight: HashSet<String>,
    flights: HashSet<u64>,
    deadline: Option<Instant>,
    next_batch_id: u64,
    stats: SessionStats,
}

impl RequestCoordinator {
    /// Create an idle coordinator.
    pub fn new(policy: BatchPolicy) -> Self {
        Self {
            policy,
            state: CoordinatorState::Idle,
            pending: Vec::new(),
            pending_urls: HashSet::new(),
            in_flight: HashSet::new(),
            flights: HashSet::new(),
            deadline: None,
            next_batch_id: 0,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// When the debounce timer expires, if it is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the debounce timer has expired at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of batches awaiting completion.
    pub fn flights(&self) -> usize {
        self.flights.len()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Queue a label request for `request.tile`.
    pub fn enqueue(
        &mut self,
        cache: &LabelCache,
        request: PendingRequest,
        now: Instant,
    ) -> EnqueueOutcome {
        let cached = cache.get(&request.url);
        if cached.is_resolved() {
            self.stats.cache_hits += 1;
            return EnqueueOutcome::Resolved(cached);
        }

        if self.in_flight.contains(&request.url) {
            self.stats.duplicates_suppressed += 1;
            return EnqueueOutcome::AlreadyQueued;
        }

        if self.pending_urls.contains(&request.url) {
            // Keep the most recent draw bounds for the handoff
            if let Some(existing) = self.pending.iter_mut().find(|p| p.url == request.url) {
                if request.bounds.is_some() {
                    existing.bounds = request.bounds;
                }
            }
            self.stats.duplicates_suppressed += 1;
            return EnqueueOutcome::AlreadyQueued;
        }

        trace!(url = %request.url, "Queued label request");
        self.pending_urls.insert(request.url.clone());
        self.pending.push(request);
        self.state = CoordinatorState::Accumulating;

        if self.pending.len() >= self.policy.threshold.max(1) {
            self.deadline = None;
            return EnqueueOutcome::ThresholdReached;
        }

        let deadline = now + self.policy.debounce;
        self.deadline = Some(deadline);
        EnqueueOutcome::Queued { deadline }
    }

    /// Take every pending request and turn it into a batch.
    ///
    /// Requests resolved since they were queued are dropped. Returns `None`
    /// when nothing is left to send.
    pub fn begin_flush(&mut self, cache: &LabelCache) -> Option<FlushBatch> {
        self.deadline = None;
        let pending = std::mem::take(&mut self.pending);
        self.pending_urls.clear();

        let before = pending.len();
        let requests: Vec<_> = pending
            .into_iter()
            .filter(|r| !cache.is_resolved(&r.url) && !self.in_flight.contains(&r.url))
            .collect();
        let dropped = before - requests.len();
        if dropped > 0 {
            self.stats.rechecked_dropped += dropped as u64;
            debug!(dropped, "Dropped already resolved urls from batch");
        }

        if requests.is_empty() {
            self.refresh_state();
            return None;
        }

        let id = self.next_batch_id;
        self.next_batch_id += 1;
        for request in &requests {
            self.in_flight.insert(request.url.clone());
        }
        self.flights.insert(id);
        self.stats.batches_issued += 1;
        self.state = CoordinatorState::Flushing;

        debug!(batch = id, count = requests.len(), "Flushing label requests");
        Some(FlushBatch { id, requests })
    }

    /// Record the answers for `batch` in the cache.
    ///
    /// Returns one [`ResolvedTile`] per request in the batch. If requests
    /// accumulated during the flush the debounce timer is re-armed from `now`.
    pub fn complete_flush(
        &mut self,
        cache: &mut LabelCache,
        batch: FlushBatch,
        resolution: BatchResolution,
        now: Instant,
    ) -> Vec<ResolvedTile> {
        if let LookupPath::Fallback { lookups, .. } = resolution.path {
            self.stats.batch_failures += 1;
            self.stats.fallback_lookups += lookups as u64;
        }

        let mut labels = resolution.labels;
        let mut resolved = Vec::with_capacity(batch.requests.len());

        for request in batch.requests {
            self.in_flight.remove(&request.url);

            let label = match cache.get(&request.url) {
                LabelState::Unresolved => {
                    let label = labels.remove(&request.url).flatten();
                    cache.set(&request.tile, &request.url, label);
                    let label = cache.get(&request.url).label().map(str::to_string);
                    if label.is_some() {
                        self.stats.labels_resolved += 1;
                    } else {
                        self.stats.labels_missing += 1;
                    }
                    label
                }
                already => already.label().map(str::to_string),
            };

            resolved.push(ResolvedTile {
                tile: request.tile,
                bounds: request.bounds,
                label,
            });
        }

        self.flights.remove(&batch.id);
        if !self.pending.is_empty() && self.deadline.is_none() {
            self.deadline = Some(now + self.policy.debounce);
        }
        self.refresh_state();
        resolved
    }

    /// Drop every pending request and forget in-flight batches.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.pending_urls.clear();
        self.in_flight.clear();
        self.flights.clear();
        self.deadline = None;
        self.state = CoordinatorState::Idle;
    }

    fn refresh_state(&mut self) {
        self.state = if !self.pending.is_empty() {
            CoordinatorState::Accumulating
        } else if !self.flights.is_empty() {
            CoordinatorState::Flushing
        } else {
            CoordinatorState::Idle
        };
    }
}

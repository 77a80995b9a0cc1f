//! Request batching.
//!
//! Tile-drawn events produce far more label requests than the label service
//! should see. The [`RequestCoordinator`] collects them, drops duplicates and
//! cached urls, and releases a [`FlushBatch`] either when the debounce timer
//! runs out or when enough requests have piled up. [`resolve_batch`] answers a
//! batch, falling back to single lookups if the batched call fails.

mod lookup;
mod state;

pub use lookup::resolve_batch;
pub use state::{
    BatchPolicy, BatchResolution, CoordinatorState, EnqueueOutcome, FlushBatch, LookupPath,
    PendingRequest, RequestCoordinator, ResolvedTile, DEFAULT_BATCH_THRESHOLD, DEFAULT_DEBOUNCE,
};

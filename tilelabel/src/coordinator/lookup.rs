//! Resolving a batch against the label service.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::state::{BatchResolution, LookupPath};
use crate::error::LookupError;
use crate::service::LabelService;

/// Bound `future` by `limit`, reporting expiry as [`LookupError::Timeout`].
async fn with_timeout<T>(
    limit: Duration,
    future: impl Future<Output = Result<T, LookupError>>,
) -> Result<T, LookupError> {
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(LookupError::Timeout(limit)),
    }
}

/// Look up labels for every url in `urls`.
///
/// Issues one batched lookup. If it fails, each url is looked up on its own,
/// one after another. A single lookup that fails is recorded as "no label".
/// Every call is bounded by `timeout`, so this always completes with an entry
/// for each url.
pub async fn resolve_batch(
    service: &dyn LabelService,
    urls: &[String],
    timeout: Duration,
) -> BatchResolution {
    match with_timeout(timeout, service.lookup_batch(urls)).await {
        Ok(mut found) => {
            let labels = urls
                .iter()
                .map(|url| (url.clone(), found.remove(url)))
                .collect();
            BatchResolution {
                labels,
                path: LookupPath::Batched,
            }
        }
        Err(e) => {
            warn!(count = urls.len(), error = %e, "Batched label lookup failed, falling back to single lookups");
            resolve_individually(service, urls, timeout).await
        }
    }
}

async fn resolve_individually(
    service: &dyn LabelService,
    urls: &[String],
    timeout: Duration,
) -> BatchResolution {
    let mut labels = HashMap::with_capacity(urls.len());
    let mut failures = 0;

    for url in urls {
        let label = match with_timeout(timeout, service.lookup_one(url)).await {
            Ok(label) => label,
            Err(e) => {
                warn!(url = %url, error = %e, "Label lookup failed, recording no label");
                failures += 1;
                None
            }
        };
        labels.insert(url.clone(), label);
    }

    debug!(lookups = urls.len(), failures, "Fallback lookups complete");
    BatchResolution {
        labels,
        path: LookupPath::Fallback {
            lookups: urls.len(),
            failures,
        },
    }
}

//! Scripted label service for unit tests.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use super::traits::LabelService;
use crate::error::LookupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Batch(Vec<String>),
    Single(String),
}

/// Answers from a fixed label table, with switchable failures.
#[derive(Default)]
pub(crate) struct ScriptedLabelService {
    labels: HashMap<String, String>,
    batch_error: Option<LookupError>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    delay: Duration,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedLabelService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_label(mut self, url: &str, label: &str) -> Self {
        self.labels.insert(url.to_string(), label.to_string());
        self
    }

    pub(crate) fn failing_batches(mut self, error: LookupError) -> Self {
        self.batch_error = Some(error);
        self
    }

    pub(crate) fn failing_single(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub(crate) fn hanging_single(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// How many times `url` was sent to the service, in any form.
    pub(crate) fn times_requested(&self, url: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .map(|call| match call {
                Call::Batch(urls) => urls.iter().filter(|u| *u == url).count(),
                Call::Single(u) => usize::from(u == url),
            })
            .sum()
    }
}

impl LabelService for ScriptedLabelService {
    fn lookup_batch<'a>(
        &'a self,
        urls: &'a [String],
    ) -> BoxFuture<'a, Result<HashMap<String, String>, LookupError>> {
        Box::pin(async move {
            self.calls.lock().push(Call::Batch(urls.to_vec()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let Some(err) = &self.batch_error {
                return Err(err.clone());
            }
            Ok(urls
                .iter()
                .filter_map(|u| self.labels.get(u).map(|l| (u.clone(), l.clone())))
                .collect())
        })
    }

    fn lookup_one<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<String>, LookupError>> {
        Box::pin(async move {
            self.calls.lock().push(Call::Single(url.to_string()));
            if self.hanging.contains(url) {
                std::future::pending::<()>().await;
            }
            if self.failing.contains(url) {
                return Err(LookupError::Network("connection reset".to_string()));
            }
            Ok(self.labels.get(url).cloned())
        })
    }
}

//! Process-wide endpoint cache.
//!
//! The backend-to-dataset mapping is assumed immutable for the life of
//! the process, so entries are added lazily on first resolution and
//! never removed or expired. If the upstream reassigns or retires a
//! dataset identifier mid-process, the stale entry stays wrong until
//! restart; that trade-off is intentional.

use std::collections::HashMap;
use std::sync::RwLock;

/// What a resolved endpoint is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Purpose {
    Metadata,
    Data,
}

/// `(dataset id, purpose) → absolute URL` map, owned by whichever
/// component performs resolution and injected at construction.
///
/// Concurrent first-lookups for the same dataset may both run
/// discovery; insert-if-absent makes them converge on one value and a
/// half-written entry impossible.
#[derive(Debug, Default)]
pub struct EndpointCache {
    inner: RwLock<HashMap<(String, Purpose), String>>,
}

impl EndpointCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached URL for the given dataset and purpose, if any.
    pub fn get(&self, dataset_id: &str, purpose: Purpose) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.get(&(dataset_id.to_string(), purpose)).cloned()
    }

    /// Insert the URL unless another resolution got there first;
    /// returns the winning value either way.
    pub fn insert_if_absent(&self, dataset_id: &str, purpose: Purpose, url: String) -> String {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard
            .entry((dataset_id.to_string(), purpose))
            .or_insert(url)
            .clone()
    }

    /// Number of cached endpoints, bounded only by the distinct
    /// datasets resolved during the process lifetime.
    pub fn len(&self) -> usize {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

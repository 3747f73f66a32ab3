use serde::{Deserialize, Serialize};

/// A request to read the value stored under `key`.
///
/// The flags decide which layers the engine consults and in which order:
///
/// - `skip_caches`: bypass the memory cache and the source of truth and go
///   straight to the fetcher.
/// - `refresh`: after serving a valid cached or stored value, fetch again and
///   emit the fresh value as well.
/// - `fall_back_to_source_of_truth`: when the fetcher fails, serve the stored
///   value instead of an error if one is available and valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest<K> {
    pub key: K,
    pub skip_caches: bool,
    pub refresh: bool,
    pub fall_back_to_source_of_truth: bool,
}

impl<K> ReadRequest<K> {
    /// Creates a request that consults every layer once.
    pub fn new(key: K) -> Self {
        Self {
            key,
            skip_caches: false,
            refresh: false,
            fall_back_to_source_of_truth: false,
        }
    }

    /// Creates a request that always hits the fetcher.
    pub fn fresh(key: K) -> Self {
        Self {
            key,
            skip_caches: true,
            refresh: true,
            fall_back_to_source_of_truth: false,
        }
    }

    /// Like [`ReadRequest::fresh`], but serves the stored value when the
    /// fetcher fails.
    pub fn fresh_with_fallback(key: K) -> Self {
        Self::fresh(key).with_fallback(true)
    }

    /// Creates a request that serves cached data first, refetching afterwards
    /// when `refresh` is set.
    pub fn cached(key: K, refresh: bool) -> Self {
        Self {
            key,
            skip_caches: false,
            refresh,
            fall_back_to_source_of_truth: false,
        }
    }

    pub fn with_fallback(mut self, fall_back_to_source_of_truth: bool) -> Self {
        self.fall_back_to_source_of_truth = fall_back_to_source_of_truth;
        self
    }
}

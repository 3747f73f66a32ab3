use std::hash::Hash;
use std::time::Duration;

use tierstore_core::cache::{EvictionPolicy, DEFAULT_MAX_COUNT};

use super::BoundedCache;
use crate::config::StoreConfig;

/// Builder for [`BoundedCache`].
///
/// Defaults: 1000 entries, LRU eviction, no expiration.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    max_count: usize,
    eviction_policy: EvictionPolicy,
    expiration_duration: Option<Duration>,
}

impl CacheBuilder {
    pub fn new() -> Self {
        Self {
            max_count: DEFAULT_MAX_COUNT,
            eviction_policy: EvictionPolicy::Lru,
            expiration_duration: None,
        }
    }

    /// Takes capacity and expiration from the store configuration.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            max_count: config.cache_max_entries,
            eviction_policy: EvictionPolicy::Lru,
            expiration_duration: config.cache_ttl(),
        }
    }

    pub fn max_count(mut self, count: usize) -> Self {
        self.max_count = count;
        self
    }

    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn expiration_duration(mut self, duration: Duration) -> Self {
        self.expiration_duration = Some(duration);
        self
    }

    /// Builds the cache. A zero capacity is raised to one.
    pub fn build<K, V>(self) -> BoundedCache<K, V>
    where
        K: Hash + Eq + Clone,
        V: Clone,
    {
        let max_count = if self.max_count == 0 {
            tracing::warn!("Memory cache max_count of 0 raised to 1");
            1
        } else {
            self.max_count
        };

        BoundedCache::new(max_count, self.eviction_policy, self.expiration_duration)
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Bounded in-memory cache with LRU eviction and optional expiration.
//!
//! Recency is tracked by an unbounded `LruCache`: every `get` and `put`
//! promotes the key. Capacity is enforced here rather than by the `LruCache`
//! itself so that a full cache sheds a batch of entries at once instead of a
//! single one per insert.

use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

use tierstore_core::cache::{retained_after_eviction, Cache, EvictionPolicy};

/// A single cache entry and the instant it was stored.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    /// Returns true if this entry is older than `ttl`.
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Thread-safe, fixed-capacity cache.
///
/// Expired entries are removed lazily when read, and eagerly at the start of
/// an eviction pass. When a new key is written into a full cache the least
/// recently used entries are dropped until only
/// [`retained_after_eviction`] entries remain.
///
/// Clones share the same underlying storage.
#[derive(Clone)]
pub struct BoundedCache<K, V>
where
    K: Hash + Eq,
{
    store: Arc<Mutex<LruCache<K, CacheEntry<V>>>>,
    max_count: usize,
    retained: usize,
    eviction_policy: EvictionPolicy,
    expiration: Option<Duration>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache; `max_count` must already be positive.
    pub(crate) fn new(
        max_count: usize,
        eviction_policy: EvictionPolicy,
        expiration: Option<Duration>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(LruCache::unbounded())),
            max_count,
            retained: retained_after_eviction(max_count),
            eviction_policy,
            expiration,
        }
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, CacheEntry<V>>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
        self.expiration.is_some_and(|ttl| entry.is_expired(ttl))
    }

    /// Drops expired entries, then trims to the retained threshold.
    fn evict(&self, store: &mut LruCache<K, CacheEntry<V>>) {
        let before = store.len();

        if self.expiration.is_some() {
            let expired: Vec<K> = store
                .iter()
                .filter(|(_, entry)| self.is_expired(entry))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &expired {
                store.pop(key);
            }
        }

        match self.eviction_policy {
            EvictionPolicy::Lru => {
                while store.len() > self.retained {
                    if store.pop_lru().is_none() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            evicted = before - store.len(),
            retained = store.len(),
            max_count = self.max_count,
            "Memory cache eviction pass"
        );
    }
}

impl<K, V> Cache<K, V> for BoundedCache<K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        let mut store = self.lock();

        match store.get(key) {
            Some(entry) if self.is_expired(entry) => {}
            Some(entry) => return Some(entry.value.clone()),
            None => return None,
        }

        // Expired entries are treated as absent and removed on the spot.
        store.pop(key);
        tracing::trace!("Expired memory cache entry removed");
        None
    }

    fn put(&self, value: V, key: K) {
        let mut store = self.lock();

        if !store.contains(&key) && store.len() >= self.max_count {
            self.evict(&mut store);
        }

        store.put(key, CacheEntry::new(value));
    }

    fn invalidate(&self, key: &K) {
        let mut store = self.lock();
        store.pop(key);
    }

    fn invalidate_all(&self) {
        let mut store = self.lock();
        store.clear();
    }

    fn size(&self) -> usize {
        self.lock().len()
    }
}

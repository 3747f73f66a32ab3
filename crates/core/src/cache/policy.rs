//! Eviction policy and the pure arithmetic behind an eviction pass.

use serde::{Deserialize, Serialize};

/// Default capacity of a memory cache.
pub const DEFAULT_MAX_COUNT: usize = 1000;

/// Share of the capacity kept when an eviction pass runs.
pub const RETAINED_FRACTION: f64 = 0.9;

/// How entries are ranked when the cache is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Least recently used entries are dropped first.
    #[default]
    Lru,
}

/// Number of entries an eviction pass keeps for a cache of `max_count`.
///
/// The threshold is `RETAINED_FRACTION` of the capacity, rounded down but
/// never below one, and always leaves room for the entry being inserted.
/// A cache with capacity one therefore retains nothing.
pub fn retained_after_eviction(max_count: usize) -> usize {
    if max_count == 0 {
        return 0;
    }
    let threshold = ((max_count as f64) * RETAINED_FRACTION).floor() as usize;
    threshold.clamp(1, max_count).min(max_count - 1)
}

use std::{env, time::Duration};

use serde::{Deserialize, Serialize};

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of memory cache entries (default: 1,000)
    pub cache_max_entries: usize,
    /// Memory cache TTL in seconds (default: none, entries never expire)
    pub cache_ttl_seconds: Option<u64>,
    /// Events buffered per key while nobody is subscribed (default: 64)
    pub replay_buffer_size: usize,
    /// Number of per-key pipelines above which idle ones are swept (default: 1,024)
    pub pipeline_sweep_threshold: usize,
}

impl StoreConfig {
    /// Built-in defaults, ignoring the environment.
    pub fn defaults() -> Self {
        Self {
            cache_max_entries: 1_000,
            cache_ttl_seconds: None,
            replay_buffer_size: 64,
            pipeline_sweep_threshold: 1_024,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TIERSTORE_CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1,000)
    /// - `TIERSTORE_CACHE_TTL_SECONDS` - Cache TTL in seconds (default: unset)
    /// - `TIERSTORE_REPLAY_BUFFER_SIZE` - Per-key replay buffer (default: 64)
    /// - `TIERSTORE_PIPELINE_SWEEP_THRESHOLD` - Idle pipeline sweep threshold (default: 1,024)
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            cache_max_entries: parse_var("TIERSTORE_CACHE_MAX_ENTRIES")
                .unwrap_or(defaults.cache_max_entries),
            cache_ttl_seconds: parse_var("TIERSTORE_CACHE_TTL_SECONDS"),
            replay_buffer_size: parse_var("TIERSTORE_REPLAY_BUFFER_SIZE")
                .unwrap_or(defaults.replay_buffer_size),
            pipeline_sweep_threshold: parse_var("TIERSTORE_PIPELINE_SWEEP_THRESHOLD")
                .unwrap_or(defaults.pipeline_sweep_threshold),
        }
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_seconds.map(Duration::from_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

//! In-memory cache backend.
//!
//! Provides a thread-safe, bounded cache with LRU eviction and optional
//! expiration, plus the builder used to configure it.

mod builder;
mod cache;

pub use builder::CacheBuilder;
pub use cache::BoundedCache;

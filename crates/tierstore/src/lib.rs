//! Layered, reactive data access.
//!
//! A [`Store`] answers reads by walking three layers in order: a bounded
//! in-memory cache, a durable source of truth and a remote fetcher. Each read
//! returns a stream of [`ReadResponse`] events describing where the value is
//! being looked for and where it was found. Reads for the same key share one
//! multicast channel, so concurrent readers observe the same sequence.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tierstore::{fetcher::SingleFetcher, IdentityConverter, ReadRequest, Store};
//!
//! let fetcher = SingleFetcher::named("api", |id: u64| async move { load(id).await });
//! let store = Store::builder(Arc::new(fetcher), Arc::new(IdentityConverter))
//!     .default_memory_cache()
//!     .build();
//!
//! let mut events = store.read(ReadRequest::cached(42, false));
//! while let Some(event) = events.next().await {
//!     println!("{event:?}");
//! }
//! ```

pub mod cache;
pub mod channel;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod storage;
mod store;

pub use tierstore_core::cache::Cache;
pub use tierstore_core::{
    CacheError, Converter, Fetcher, FetcherError, FetcherResult, FetcherStream, IdentityConverter,
    Origin, PersistenceError, PersistenceResult, ReadRequest, ReadResponse, SourceOfTruth,
    SourceOfTruthError, SourceOfTruthStream, StoreError, StoreKey, StoreValue, Validator,
};

pub use cache::{BoundedCache, CacheBuilder};
pub use channel::{EventStream, MulticastReplayChannel};
pub use config::StoreConfig;
pub use error::GetError;
pub use orchestrator::RequestOrchestrator;
pub use store::{Store, StoreBuilder};

//! Core types for the tierstore data-access engine.
//!
//! This crate holds everything that does not perform I/O: the read request
//! and response model, the layered error taxonomy, the capability traits the
//! engine calls into (fetcher, source of truth, converter, validator, cache)
//! and the pure arithmetic behind cache eviction.
//!
//! Concrete implementations live in the `tierstore` crate.

pub mod cache;
pub mod converter;
pub mod error;
pub mod fetcher;
pub mod request;
pub mod response;
pub mod source_of_truth;
pub mod validator;

use std::fmt::Debug;
use std::hash::Hash;

pub use converter::{Converter, IdentityConverter};
pub use error::{
    CacheError, FetcherError, PersistenceError, PersistenceResult, SourceOfTruthError, StoreError,
};
pub use fetcher::{Fetcher, FetcherResult, FetcherStream};
pub use request::ReadRequest;
pub use response::{Origin, ReadResponse};
pub use source_of_truth::{SourceOfTruth, SourceOfTruthStream};
pub use validator::Validator;

/// Bounds every request key must satisfy.
///
/// Keys are cloned into per-key bookkeeping and background tasks, hashed for
/// lookups and logged through `Debug`.
pub trait StoreKey: Hash + Eq + Clone + Debug + Send + Sync + 'static {}

impl<T> StoreKey for T where T: Hash + Eq + Clone + Debug + Send + Sync + 'static {}

/// Bounds every value flowing through the engine (network, local and output
/// representations alike).
pub trait StoreValue: Clone + Send + Sync + 'static {}

impl<T> StoreValue for T where T: Clone + Send + Sync + 'static {}

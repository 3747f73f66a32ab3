//! Ready-made [`Fetcher`](tierstore_core::Fetcher) implementations.

mod fallback;
mod single;

pub use fallback::FallbackFetcher;
pub use single::SingleFetcher;

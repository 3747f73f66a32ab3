use std::pin::Pin;
use std::sync::Arc;

use tokio_stream::Stream;

use crate::error::StoreError;

/// Stream of results produced by a single fetch.
pub type FetcherStream<N> = Pin<Box<dyn Stream<Item = FetcherResult<N>> + Send + 'static>>;

/// One result emitted by a fetcher.
#[derive(Debug, Clone, PartialEq)]
pub enum FetcherResult<N> {
    Data {
        value: N,
        fetcher_name: Option<String>,
    },
    Error(StoreError),
}

impl<N> FetcherResult<N> {
    /// Wraps a plain `Result`, tagging data with the fetcher name.
    pub fn from_result(result: Result<N, StoreError>, fetcher_name: Option<String>) -> Self {
        match result {
            Ok(value) => FetcherResult::Data {
                value,
                fetcher_name,
            },
            Err(error) => FetcherResult::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FetcherResult::Error(_))
    }
}

/// Remote retrieval of the network representation of a key.
///
/// A fetch returns a stream so that a fetcher may emit more than one result
/// (for example a cached response followed by a revalidated one). The engine
/// persists and emits every `Data` result it receives.
pub trait Fetcher<K, N>: Send + Sync {
    fn fetch(&self, key: &K) -> FetcherStream<N>;

    /// Name reported in `Origin::Fetcher` events.
    fn name(&self) -> Option<String> {
        None
    }

    /// Secondary fetcher this one switches to when it fails, if any.
    ///
    /// Informational only: the engine never calls it. A fetcher that wants a
    /// fallback must switch inside its own `fetch` stream, as
    /// `tierstore::fetcher::FallbackFetcher` does.
    fn fallback(&self) -> Option<Arc<dyn Fetcher<K, N>>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetcherError;

    #[test]
    fn test_from_result_ok() {
        let result = FetcherResult::from_result(Ok(5), Some("api".to_string()));
        assert_eq!(
            result,
            FetcherResult::Data {
                value: 5,
                fetcher_name: Some("api".to_string())
            }
        );
        assert!(!result.is_error());
    }

    #[test]
    fn test_from_result_err() {
        let result: FetcherResult<u8> =
            FetcherResult::from_result(Err(FetcherError::InvalidUrl.into()), None);
        assert!(result.is_error());
    }

    struct Empty;

    impl Fetcher<u8, u8> for Empty {
        fn fetch(&self, _key: &u8) -> FetcherStream<u8> {
            Box::pin(tokio_stream::empty())
        }
    }

    #[test]
    fn test_default_fetcher_is_unnamed_without_fallback() {
        assert_eq!(Empty.name(), None);
        assert!(Empty.fallback().is_none());
    }
}

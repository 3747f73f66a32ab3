use std::future::Future;
use std::marker::PhantomData;

use tierstore_core::{Fetcher, FetcherResult, FetcherStream, StoreError};

/// Fetcher that runs one async lookup per fetch and emits its outcome.
///
/// ```ignore
/// let fetcher = SingleFetcher::named("api", |id: u64| async move {
///     client.get_item(id).await.map_err(StoreError::network)
/// });
/// ```
pub struct SingleFetcher<F, K, N> {
    name: Option<String>,
    lookup: F,
    _marker: PhantomData<fn(K) -> N>,
}

impl<F, Fut, K, N> SingleFetcher<F, K, N>
where
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<N, StoreError>> + Send + 'static,
{
    /// Creates an unnamed fetcher.
    pub fn new(lookup: F) -> Self {
        Self {
            name: None,
            lookup,
            _marker: PhantomData,
        }
    }

    /// Creates a fetcher reported as `name` in response origins.
    pub fn named(name: impl Into<String>, lookup: F) -> Self {
        Self {
            name: Some(name.into()),
            lookup,
            _marker: PhantomData,
        }
    }
}

impl<F, Fut, K, N> Fetcher<K, N> for SingleFetcher<F, K, N>
where
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<N, StoreError>> + Send + 'static,
    K: Clone,
    N: Send + 'static,
{
    fn fetch(&self, key: &K) -> FetcherStream<N> {
        let lookup = (self.lookup)(key.clone());
        let name = self.name.clone();

        Box::pin(async_stream::stream! {
            yield FetcherResult::from_result(lookup.await, name);
        })
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tierstore_core::FetcherError;
    use tokio_stream::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_emits_single_data_result() {
        let fetcher = SingleFetcher::named("api", |key: u32| async move { Ok(key * 2) });

        let results: Vec<_> = fetcher.fetch(&21).collect().await;

        assert_eq!(
            results,
            vec![FetcherResult::Data {
                value: 42,
                fetcher_name: Some("api".to_string())
            }]
        );
        assert_eq!(fetcher.name(), Some("api".to_string()));
        assert!(fetcher.fallback().is_none());
    }

    #[tokio::test]
    async fn test_emits_error_result() {
        let fetcher = SingleFetcher::new(|_key: u32| async move {
            Err::<u32, _>(StoreError::network("connection reset"))
        });

        let results: Vec<_> = fetcher.fetch(&1).collect().await;

        assert_eq!(
            results,
            vec![FetcherResult::Error(StoreError::Fetcher(
                FetcherError::NetworkError("connection reset".to_string())
            ))]
        );
        assert_eq!(fetcher.name(), None);
    }

    #[tokio::test]
    async fn test_lookup_runs_once_per_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetcher = SingleFetcher::new(move |key: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(key) }
        });

        let _: Vec<_> = fetcher.fetch(&1).collect().await;
        let _: Vec<_> = fetcher.fetch(&2).collect().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

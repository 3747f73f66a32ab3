use std::sync::Arc;

use tierstore_core::{Fetcher, FetcherResult, FetcherStream};
use tokio_stream::StreamExt;

/// Named fetcher that switches to a secondary fetcher when the primary fails.
///
/// Results from the primary pass through until it emits its first error. The
/// error is not forwarded; the fallback's stream replaces the rest of the
/// primary's. Fallback data without a name of its own is tagged with the
/// fallback's name.
pub struct FallbackFetcher<K, N> {
    name: String,
    primary: Arc<dyn Fetcher<K, N>>,
    fallback: Arc<dyn Fetcher<K, N>>,
}

impl<K, N> FallbackFetcher<K, N> {
    pub fn new(
        name: impl Into<String>,
        primary: Arc<dyn Fetcher<K, N>>,
        fallback: Arc<dyn Fetcher<K, N>>,
    ) -> Self {
        Self {
            name: name.into(),
            primary,
            fallback,
        }
    }
}

impl<K, N> Fetcher<K, N> for FallbackFetcher<K, N>
where
    K: Clone + Send + Sync + 'static,
    N: Send + 'static,
{
    fn fetch(&self, key: &K) -> FetcherStream<N> {
        let mut primary = self.primary.fetch(key);
        let fallback = self.fallback.clone();
        let name = self.name.clone();
        let key = key.clone();

        Box::pin(async_stream::stream! {
            while let Some(result) = primary.next().await {
                let err = match result {
                    FetcherResult::Error(err) => err,
                    data => {
                        yield data;
                        continue;
                    }
                };

                tracing::warn!(
                    fetcher = %name,
                    error = %err,
                    "Primary fetcher failed, using fallback"
                );
                let fallback_name = fallback.name();
                let mut secondary = fallback.fetch(&key);
                while let Some(result) = secondary.next().await {
                    yield match result {
                        FetcherResult::Data { value, fetcher_name } => FetcherResult::Data {
                            value,
                            fetcher_name: fetcher_name.or_else(|| fallback_name.clone()),
                        },
                        error => error,
                    };
                }
                break;
            }
        })
    }

    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn fallback(&self) -> Option<Arc<dyn Fetcher<K, N>>> {
        Some(self.fallback.clone())
    }
}

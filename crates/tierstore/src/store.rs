//! The public entry point: a [`Store`] and its builder.

use std::sync::Arc;

use tokio_stream::StreamExt;

use tierstore_core::cache::Cache;
use tierstore_core::{
    CacheError, Converter, Fetcher, PersistenceResult, ReadRequest, ReadResponse, SourceOfTruth,
    StoreError, StoreKey, StoreValue, Validator,
};

use crate::cache::CacheBuilder;
use crate::channel::EventStream;
use crate::config::StoreConfig;
use crate::error::{GetError, Result};
use crate::orchestrator::{ReadHandler, RequestOrchestrator};

/// Layered read access to values of type `O` keyed by `K`.
///
/// `N` is the type fetchers produce and `L` the type the source of truth
/// stores; a [`Converter`] maps between the three.
pub struct Store<K, N, L, O> {
    orchestrator: RequestOrchestrator<K, N, L, O>,
    source_of_truth: Option<Arc<dyn SourceOfTruth<K, L, O>>>,
    memory_cache: Option<Arc<dyn Cache<K, O>>>,
}

impl<K, N, L, O> Store<K, N, L, O>
where
    K: StoreKey,
    N: StoreValue,
    L: StoreValue,
    O: StoreValue,
{
    pub fn builder(
        fetcher: Arc<dyn Fetcher<K, N>>,
        converter: Arc<dyn Converter<N, L, O>>,
    ) -> StoreBuilder<K, N, L, O> {
        StoreBuilder::new(fetcher, converter)
    }

    /// Starts a read and returns the stream of events for its key.
    ///
    /// Returns immediately; the work runs on a spawned task, so this must be
    /// called from within a tokio runtime.
    pub fn read(&self, request: ReadRequest<K>) -> EventStream<ReadResponse<O>> {
        self.orchestrator.read(request)
    }

    /// Reads `key` from the nearest layer and waits for the value.
    ///
    /// A stale local value does not fail the call; the refetch it triggers
    /// provides the result instead.
    pub async fn get(&self, key: K) -> Result<O> {
        let mut events = self.read(ReadRequest::cached(key, false));

        while let Some(response) = events.next().await {
            if matches!(
                response.error_ref(),
                Some(StoreError::Cache(CacheError::ValidationFailed))
            ) {
                continue;
            }
            response.throw_if_error()?;
            if let Some(value) = response.into_data() {
                return Ok(value);
            }
        }

        Err(GetError::Interrupted)
    }

    /// Removes `key` from the memory cache, then from the source of truth.
    pub async fn clear(&self, key: &K) -> PersistenceResult<()> {
        if let Some(cache) = &self.memory_cache {
            cache.invalidate(key);
        }
        if let Some(source_of_truth) = &self.source_of_truth {
            source_of_truth.delete(key).await?;
        }
        tracing::debug!(key = ?key, "Cleared key");
        Ok(())
    }

    /// Empties the memory cache, then the source of truth.
    pub async fn clear_all(&self) -> PersistenceResult<()> {
        if let Some(cache) = &self.memory_cache {
            cache.invalidate_all();
        }
        if let Some(source_of_truth) = &self.source_of_truth {
            source_of_truth.delete_all().await?;
        }
        tracing::debug!("Cleared all keys");
        Ok(())
    }

    /// Aborts in-flight reads and ends every open stream.
    pub fn shutdown(&self) {
        self.orchestrator.shutdown();
    }

    pub fn memory_cache(&self) -> Option<&Arc<dyn Cache<K, O>>> {
        self.memory_cache.as_ref()
    }

    /// Number of keys currently holding a pipeline.
    pub fn active_keys(&self) -> usize {
        self.orchestrator.active_keys()
    }
}

/// Builder for [`Store`].
///
/// Only the fetcher and converter are required. Without a memory cache or
/// source of truth the corresponding layer is skipped; without a validator
/// every local value is considered fresh.
pub struct StoreBuilder<K, N, L, O> {
    fetcher: Arc<dyn Fetcher<K, N>>,
    converter: Arc<dyn Converter<N, L, O>>,
    source_of_truth: Option<Arc<dyn SourceOfTruth<K, L, O>>>,
    memory_cache: Option<Arc<dyn Cache<K, O>>>,
    validator: Option<Arc<dyn Validator<O>>>,
    config: Option<StoreConfig>,
    default_memory_cache: bool,
}

impl<K, N, L, O> StoreBuilder<K, N, L, O>
where
    K: StoreKey,
    N: StoreValue,
    L: StoreValue,
    O: StoreValue,
{
    pub fn new(fetcher: Arc<dyn Fetcher<K, N>>, converter: Arc<dyn Converter<N, L, O>>) -> Self {
        Self {
            fetcher,
            converter,
            source_of_truth: None,
            memory_cache: None,
            validator: None,
            config: None,
            default_memory_cache: false,
        }
    }

    pub fn source_of_truth(mut self, source_of_truth: Arc<dyn SourceOfTruth<K, L, O>>) -> Self {
        self.source_of_truth = Some(source_of_truth);
        self
    }

    pub fn memory_cache(mut self, memory_cache: Arc<dyn Cache<K, O>>) -> Self {
        self.memory_cache = Some(memory_cache);
        self.default_memory_cache = false;
        self
    }

    /// Uses a [`BoundedCache`](crate::cache::BoundedCache) sized from the
    /// store configuration.
    pub fn default_memory_cache(mut self) -> Self {
        self.memory_cache = None;
        self.default_memory_cache = true;
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator<O>>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Overrides the configuration otherwise loaded from the environment.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Store<K, N, L, O> {
        let config = self.config.unwrap_or_default();

        let memory_cache = if self.default_memory_cache {
            let cache: Arc<dyn Cache<K, O>> =
                Arc::new(CacheBuilder::from_config(&config).build::<K, O>());
            Some(cache)
        } else {
            self.memory_cache
        };

        tracing::debug!(
            memory_cache = memory_cache.is_some(),
            source_of_truth = self.source_of_truth.is_some(),
            validator = self.validator.is_some(),
            fetcher = ?self.fetcher.name(),
            "Building store"
        );

        let handler = ReadHandler::new(
            self.fetcher,
            self.converter,
            self.source_of_truth.clone(),
            memory_cache.clone(),
            self.validator,
        );

        Store {
            orchestrator: RequestOrchestrator::new(handler, &config),
            source_of_truth: self.source_of_truth,
            memory_cache,
        }
    }
}

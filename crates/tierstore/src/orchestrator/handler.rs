//! The per-request state machine.
//!
//! A read walks memory cache, source of truth and fetcher in that order,
//! emitting a `Loading` event as it enters each layer. Values found locally
//! are validated before being emitted; stale values trigger a fetch. Fetched
//! values are written back to both local layers.

use std::sync::Arc;

use tokio_stream::StreamExt;

use tierstore_core::cache::Cache;
use tierstore_core::{
    CacheError, Converter, Fetcher, FetcherError, FetcherResult, Origin, PersistenceResult,
    ReadRequest, ReadResponse, SourceOfTruth, SourceOfTruthError, StoreKey, StoreValue, Validator,
};

use crate::channel::MulticastReplayChannel;

type Events<O> = MulticastReplayChannel<ReadResponse<O>>;

/// The collaborators a read needs, shared by every request of a store.
pub(crate) struct ReadHandler<K, N, L, O> {
    fetcher: Arc<dyn Fetcher<K, N>>,
    converter: Arc<dyn Converter<N, L, O>>,
    source_of_truth: Option<Arc<dyn SourceOfTruth<K, L, O>>>,
    memory_cache: Option<Arc<dyn Cache<K, O>>>,
    validator: Option<Arc<dyn Validator<O>>>,
}

impl<K, N, L, O> ReadHandler<K, N, L, O>
where
    K: StoreKey,
    N: StoreValue,
    L: StoreValue,
    O: StoreValue,
{
    pub(crate) fn new(
        fetcher: Arc<dyn Fetcher<K, N>>,
        converter: Arc<dyn Converter<N, L, O>>,
        source_of_truth: Option<Arc<dyn SourceOfTruth<K, L, O>>>,
        memory_cache: Option<Arc<dyn Cache<K, O>>>,
        validator: Option<Arc<dyn Validator<O>>>,
    ) -> Self {
        Self {
            fetcher,
            converter,
            source_of_truth,
            memory_cache,
            validator,
        }
    }

    /// Runs one request to completion, emitting every event onto `events`.
    pub(crate) async fn handle(&self, request: &ReadRequest<K>, events: &Events<O>) {
        let key = &request.key;

        if request.skip_caches {
            self.network_fetch(key, request.fall_back_to_source_of_truth, events)
                .await;
            return;
        }

        events.send(ReadResponse::loading(Origin::Cache));
        let cached = self.memory_cache.as_ref().and_then(|cache| cache.get(key));
        if let Some(value) = cached {
            tracing::trace!(key = ?key, "Memory cache hit");
            self.validate(key, value, Origin::Cache, request.refresh, events)
                .await;
            return;
        }
        tracing::trace!(key = ?key, "Memory cache miss");

        events.send(ReadResponse::loading(Origin::SourceOfTruth));
        let Some(source_of_truth) = &self.source_of_truth else {
            self.network_fetch(key, false, events).await;
            return;
        };

        let mut stored = source_of_truth.read(key);
        while let Some(value) = stored.next().await {
            match value {
                Some(value) => {
                    tracing::trace!(key = ?key, "Source of truth hit");
                    self.validate(key, value, Origin::SourceOfTruth, request.refresh, events)
                        .await;
                }
                None => {
                    tracing::trace!(key = ?key, "Source of truth miss");
                    self.network_fetch(key, request.fall_back_to_source_of_truth, events)
                        .await;
                }
            }
        }
    }

    async fn is_valid(&self, value: &O) -> bool {
        match &self.validator {
            Some(validator) => validator.is_valid(value).await,
            None => true,
        }
    }

    /// Emits a locally found value, or refetches if it is stale.
    async fn validate(
        &self,
        key: &K,
        value: O,
        origin: Origin,
        refresh: bool,
        events: &Events<O>,
    ) {
        if self.is_valid(&value).await {
            events.send(ReadResponse::data(value, origin));
            if refresh {
                self.network_fetch(key, false, events).await;
            }
        } else {
            tracing::debug!(key = ?key, origin = ?origin, "Local value failed validation");
            events.send(ReadResponse::error(
                CacheError::ValidationFailed,
                Origin::Cache,
            ));
            self.network_fetch(key, false, events).await;
        }
    }

    async fn network_fetch(&self, key: &K, fall_back: bool, events: &Events<O>) {
        let name = self.fetcher.name();
        events.send(ReadResponse::loading(Origin::fetcher(name.clone())));

        let mut results = self.fetcher.fetch(key);
        while let Some(result) = results.next().await {
            match result {
                FetcherResult::Data {
                    value,
                    fetcher_name,
                } => {
                    let output = self.converter.network_to_output(&value);
                    let local = self.converter.network_to_local(&value);
                    // Failures are logged; the fetched value is still served.
                    let _ = self.persist(key, local, &output).await;
                    events.send(ReadResponse::data(
                        output,
                        Origin::fetcher(fetcher_name.or_else(|| name.clone())),
                    ));
                }
                FetcherResult::Error(err) => {
                    let err = err.into_network_error();
                    tracing::debug!(key = ?key, error = %err, "Fetch failed");
                    if fall_back {
                        self.fall_back_to_source_of_truth(key, err, name.clone(), events)
                            .await;
                    } else {
                        events.send(ReadResponse::error(err, Origin::fetcher(name.clone())));
                    }
                }
            }
        }
    }

    /// Writes a fetched value to the source of truth and the memory cache.
    ///
    /// The cache is updated even when the write fails.
    async fn persist(&self, key: &K, local: L, output: &O) -> PersistenceResult<()> {
        let written = match &self.source_of_truth {
            Some(source_of_truth) => source_of_truth.write(key, local).await,
            None => Ok(()),
        };
        if let Err(err) = &written {
            tracing::warn!(
                key = ?key,
                error = %err,
                "Failed to write fetched value to source of truth"
            );
        }

        if let Some(cache) = &self.memory_cache {
            cache.put(output.clone(), key.clone());
        }

        written
    }

    async fn fall_back_to_source_of_truth(
        &self,
        key: &K,
        error: FetcherError,
        fetcher_name: Option<String>,
        events: &Events<O>,
    ) {
        let Some(source_of_truth) = &self.source_of_truth else {
            events.send(ReadResponse::error(
                SourceOfTruthError::NilCollaborator,
                Origin::SourceOfTruth,
            ));
            return;
        };

        let mut stored = source_of_truth.read(key);
        while let Some(value) = stored.next().await {
            let valid = match &value {
                Some(value) => self.is_valid(value).await,
                None => false,
            };
            match value {
                Some(value) if valid => {
                    tracing::debug!(key = ?key, "Serving stored value after fetch failure");
                    events.send(ReadResponse::data(value, Origin::SourceOfTruth));
                }
                _ => events.send(ReadResponse::error(
                    error.clone(),
                    Origin::fetcher(fetcher_name.clone()),
                )),
            }
        }
    }
}

//! Drives reads in the background and multicasts their events per key.
//!
//! Every key gets one pipeline holding a [`MulticastReplayChannel`]. A read
//! subscribes to its key's channel, then spawns the task that walks the
//! layers; all readers of the same key observe the same event sequence from
//! the moment they subscribed.
//!
//! [`MulticastReplayChannel`]: crate::channel::MulticastReplayChannel

mod handler;
mod pipeline;

use std::sync::Arc;

use tierstore_core::{ReadRequest, ReadResponse, StoreKey, StoreValue};

use crate::channel::EventStream;
use crate::config::StoreConfig;

pub(crate) use handler::ReadHandler;
use pipeline::{InFlightGuard, PipelineArena};

/// Schedules reads and owns the per-key pipelines.
pub struct RequestOrchestrator<K, N, L, O> {
    handler: Arc<ReadHandler<K, N, L, O>>,
    pipelines: Arc<PipelineArena<K, ReadResponse<O>>>,
}

impl<K, N, L, O> RequestOrchestrator<K, N, L, O>
where
    K: StoreKey,
    N: StoreValue,
    L: StoreValue,
    O: StoreValue,
{
    pub(crate) fn new(handler: ReadHandler<K, N, L, O>, config: &StoreConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            pipelines: Arc::new(PipelineArena::new(
                config.replay_buffer_size,
                config.pipeline_sweep_threshold,
            )),
        }
    }

    /// Starts a read and returns the key's event stream.
    ///
    /// The stream is subscribed before the work is spawned, so it sees every
    /// event of this read. Must be called from within a tokio runtime.
    pub fn read(&self, request: ReadRequest<K>) -> EventStream<ReadResponse<O>> {
        let pipeline = self.pipelines.acquire(&request.key);
        let stream = pipeline.channel().subscribe();

        tracing::debug!(
            key = ?request.key,
            skip_caches = request.skip_caches,
            refresh = request.refresh,
            fall_back = request.fall_back_to_source_of_truth,
            "Starting read"
        );

        let guard = InFlightGuard::new(
            self.pipelines.clone(),
            request.key.clone(),
            pipeline.clone(),
        );
        let handler = self.handler.clone();
        let task_pipeline = pipeline.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            handler.handle(&request, task_pipeline.channel()).await;
            tracing::debug!(key = ?request.key, "Read finished");
        });
        pipeline.register(task.abort_handle());

        stream
    }

    /// Aborts running reads and ends every open stream.
    pub fn shutdown(&self) {
        self.pipelines.shutdown();
    }

    /// Number of keys with a live pipeline.
    pub fn active_keys(&self) -> usize {
        self.pipelines.len()
    }
}

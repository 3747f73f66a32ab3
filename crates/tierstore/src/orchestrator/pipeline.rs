//! Per-key pipelines: the event channel plus the tasks feeding it.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::AbortHandle;

use crate::channel::MulticastReplayChannel;

/// Everything the engine tracks for one key.
pub(crate) struct Pipeline<E> {
    channel: MulticastReplayChannel<E>,
    tasks: Mutex<Vec<AbortHandle>>,
    in_flight: AtomicUsize,
}

impl<E: Clone> Pipeline<E> {
    fn new(buffer_size: usize) -> Self {
        Self {
            channel: MulticastReplayChannel::new(buffer_size),
            tasks: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn channel(&self) -> &MulticastReplayChannel<E> {
        &self.channel
    }

    /// Tracks a spawned task so it can be aborted. Finished tasks are pruned.
    pub(crate) fn register(&self, handle: AbortHandle) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    fn abort_all(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0 && self.channel.subscriber_count() == 0
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Map of live pipelines keyed by request key.
///
/// A pipeline exists while a request for its key is running or while someone
/// still holds its stream. Acquiring bumps the in-flight count under the map
/// lock, and release checks it under the write lock, so a pipeline is never
/// dropped between being handed out and being used.
pub(crate) struct PipelineArena<K, E> {
    pipelines: RwLock<HashMap<K, Arc<Pipeline<E>>>>,
    buffer_size: usize,
    sweep_threshold: usize,
}

impl<K, E> PipelineArena<K, E>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    E: Clone,
{
    pub(crate) fn new(buffer_size: usize, sweep_threshold: usize) -> Self {
        Self {
            pipelines: RwLock::new(HashMap::new()),
            buffer_size,
            sweep_threshold,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, Arc<Pipeline<E>>>> {
        self.pipelines.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, Arc<Pipeline<E>>>> {
        self.pipelines.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gets or creates the pipeline for `key` and marks one request in flight.
    ///
    /// Every call must be paired with [`finish`](Self::finish).
    pub(crate) fn acquire(&self, key: &K) -> Arc<Pipeline<E>> {
        // Try read lock first to avoid write contention
        {
            let pipelines = self.read();
            if let Some(pipeline) = pipelines.get(key) {
                pipeline.in_flight.fetch_add(1, Ordering::SeqCst);
                return pipeline.clone();
            }
        }

        let mut pipelines = self.write();

        // Double-check after acquiring write lock
        if let Some(pipeline) = pipelines.get(key) {
            pipeline.in_flight.fetch_add(1, Ordering::SeqCst);
            return pipeline.clone();
        }

        if pipelines.len() >= self.sweep_threshold {
            let before = pipelines.len();
            pipelines.retain(|_, pipeline| !pipeline.is_idle());
            tracing::debug!(
                released = before - pipelines.len(),
                remaining = pipelines.len(),
                "Swept idle pipelines"
            );
        }

        let pipeline = Arc::new(Pipeline::new(self.buffer_size));
        pipeline.in_flight.fetch_add(1, Ordering::SeqCst);
        pipelines.insert(key.clone(), pipeline.clone());
        tracing::trace!(key = ?key, "Created pipeline");
        pipeline
    }

    /// Marks a request finished and drops the pipeline if nothing uses it.
    pub(crate) fn finish(&self, key: &K, pipeline: &Arc<Pipeline<E>>) {
        let mut pipelines = self.write();
        pipeline.in_flight.fetch_sub(1, Ordering::SeqCst);

        let current = pipelines
            .get(key)
            .is_some_and(|existing| Arc::ptr_eq(existing, pipeline));
        if current && pipeline.is_idle() {
            pipelines.remove(key);
            tracing::trace!(key = ?key, "Released idle pipeline");
        }
    }

    /// Aborts every running task and completes every channel.
    pub(crate) fn shutdown(&self) {
        let drained: Vec<_> = self.write().drain().collect();
        tracing::debug!(pipelines = drained.len(), "Shutting down pipelines");
        for (_, pipeline) in drained {
            pipeline.abort_all();
            pipeline.channel.send_completion(Ok(()));
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }
}

/// Releases a pipeline's in-flight slot when the owning task ends.
///
/// Runs on normal completion and when the task is aborted.
pub(crate) struct InFlightGuard<K, E>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    E: Clone,
{
    arena: Arc<PipelineArena<K, E>>,
    key: K,
    pipeline: Arc<Pipeline<E>>,
}

impl<K, E> InFlightGuard<K, E>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    E: Clone,
{
    pub(crate) fn new(arena: Arc<PipelineArena<K, E>>, key: K, pipeline: Arc<Pipeline<E>>) -> Self {
        Self {
            arena,
            key,
            pipeline,
        }
    }
}

impl<K, E> Drop for InFlightGuard<K, E>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    E: Clone,
{
    fn drop(&mut self) {
        self.arena.finish(&self.key, &self.pipeline);
    }
}

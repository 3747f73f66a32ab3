use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::error::PersistenceResult;

/// Stream of stored values for a key. `None` means nothing is stored.
pub type SourceOfTruthStream<O> = Pin<Box<dyn Stream<Item = Option<O>> + Send + 'static>>;

/// Durable storage that is authoritative over the memory cache.
///
/// Values are written in their local representation `L` and read back in
/// their output representation `O`. Reads never fail: a backend that cannot
/// produce a value reports absence.
#[async_trait]
pub trait SourceOfTruth<K, L, O>: Send + Sync {
    /// Reads the value stored under `key`.
    fn read(&self, key: &K) -> SourceOfTruthStream<O>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &K, value: L) -> PersistenceResult<()>;

    /// Deletes the value stored under `key`.
    async fn delete(&self, key: &K) -> PersistenceResult<()>;

    /// Deletes every stored value.
    async fn delete_all(&self) -> PersistenceResult<()>;
}

//! In-memory source of truth for tests and development.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tierstore_core::{PersistenceResult, SourceOfTruth, SourceOfTruthStream};

/// Source of truth backed by a `HashMap`.
///
/// Values are stored and returned as-is, so the local and output
/// representations are the same type. Data is lost when the last clone is
/// dropped.
#[derive(Debug, Clone)]
pub struct MemorySourceOfTruth<K, V> {
    entries: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Default for MemorySourceOfTruth<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemorySourceOfTruth<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored values.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<K: Hash + Eq, V: Clone> MemorySourceOfTruth<K, V> {
    /// Direct lookup, bypassing the stream interface.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.read().await.get(key).cloned()
    }
}

#[async_trait]
impl<K, V> SourceOfTruth<K, V, V> for MemorySourceOfTruth<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn read(&self, key: &K) -> SourceOfTruthStream<V> {
        let entries = self.entries.clone();
        let key = key.clone();

        Box::pin(async_stream::stream! {
            let value = entries.read().await.get(&key).cloned();
            yield value;
        })
    }

    async fn write(&self, key: &K, value: V) -> PersistenceResult<()> {
        self.entries.write().await.insert(key.clone(), value);
        Ok(())
    }

    async fn delete(&self, key: &K) -> PersistenceResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_all(&self) -> PersistenceResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

use std::collections::HashMap;
use std::hash::Hash;

/// In-memory key/value cache consulted before the source of truth.
///
/// Operations are synchronous and infallible: a cache that cannot answer
/// reports a miss.
pub trait Cache<K, V>: Send + Sync
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Returns the value for `key`, or `None` if absent or expired.
    fn get(&self, key: &K) -> Option<V>;

    /// Stores `value` under `key`.
    fn put(&self, value: V, key: K);

    /// Removes the value for `key`.
    fn invalidate(&self, key: &K);

    /// Removes every entry.
    fn invalidate_all(&self);

    /// Number of live entries.
    fn size(&self) -> usize;

    /// Returns the present values for `keys`; missing keys are skipped.
    fn get_all(&self, keys: &[K]) -> HashMap<K, V> {
        keys.iter()
            .filter_map(|key| self.get(key).map(|value| (key.clone(), value)))
            .collect()
    }

    fn put_all(&self, entries: HashMap<K, V>) {
        for (key, value) in entries {
            self.put(value, key);
        }
    }

    fn invalidate_keys(&self, keys: &[K]) {
        for key in keys {
            self.invalidate(key);
        }
    }

    /// Returns the cached value, computing and storing it on a miss.
    ///
    /// If `producer` fails the error is returned and the cache is left
    /// untouched.
    fn get_or_compute<E, F>(&self, key: K, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
        Self: Sized,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = producer()?;
        self.put(value.clone(), key);
        Ok(value)
    }
}

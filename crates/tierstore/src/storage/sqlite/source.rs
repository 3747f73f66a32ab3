//! SQLite source-of-truth implementation.

use std::fmt::Display;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_rusqlite::Connection;

use tierstore_core::{PersistenceError, PersistenceResult, SourceOfTruth, SourceOfTruthStream};

use super::error::{map_delete_error, map_write_error, wrap_err};
use super::schema;

/// Source of truth persisting JSON-encoded values in SQLite.
///
/// Keys are stored through their `Display` representation, so two keys that
/// format the same share a row.
pub struct SqliteSourceOfTruth<K, V> {
    conn: Connection,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V> SqliteSourceOfTruth<K, V> {
    /// Opens (or creates) a file-based database and its schema.
    pub async fn new(path: &str) -> PersistenceResult<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| PersistenceError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self {
            conn,
            _marker: PhantomData,
        })
    }

    /// Creates a database that lives as long as this value.
    pub async fn new_in_memory() -> PersistenceResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| PersistenceError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self {
            conn,
            _marker: PhantomData,
        })
    }

    async fn init_schema(conn: &Connection) -> PersistenceResult<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| PersistenceError::ConnectionFailed(e.to_string()))
    }

    /// Number of stored rows.
    pub async fn len(&self) -> PersistenceResult<usize> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row(schema::COUNT_ENTRIES, [], |row| row.get(0))
                    .map_err(wrap_err)?;
                Ok(count as usize)
            })
            .await
            .map_err(|e| PersistenceError::ConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl<K, V> SourceOfTruth<K, V, V> for SqliteSourceOfTruth<K, V>
where
    K: Display + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn read(&self, key: &K) -> SourceOfTruthStream<V> {
        let conn = self.conn.clone();
        let key = key.to_string();

        Box::pin(async_stream::stream! {
            let lookup_key = key.clone();
            let row = conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(schema::SELECT_VALUE).map_err(wrap_err)?;
                    match stmt.query_row([&lookup_key], |row| row.get::<_, String>(0)) {
                        Ok(json) => Ok(Some(json)),
                        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                        Err(e) => Err(wrap_err(e)),
                    }
                })
                .await;

            let value = match row {
                Ok(Some(json)) => match serde_json::from_str::<V>(&json) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Stored value could not be decoded");
                        None
                    }
                },
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to read stored value");
                    None
                }
            };

            yield value;
        })
    }

    async fn write(&self, key: &K, value: V) -> PersistenceResult<()> {
        let key = key.to_string();
        let json = serde_json::to_string(&value)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(schema::UPSERT_VALUE, rusqlite::params![key, json, updated_at])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_write_error)
    }

    async fn delete(&self, key: &K) -> PersistenceResult<()> {
        let key = key.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(schema::DELETE_VALUE, [&key]).map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_delete_error)
    }

    async fn delete_all(&self) -> PersistenceResult<()> {
        self.conn
            .call(|conn| {
                conn.execute(schema::DELETE_ALL, []).map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_delete_error)
    }
}

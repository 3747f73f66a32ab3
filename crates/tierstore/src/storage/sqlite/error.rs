//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` to `PersistenceError`. The operation that
//! failed decides the variant; connection problems always map to
//! `ConnectionFailed`.

use tierstore_core::PersistenceError;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
pub fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

fn map_error(
    err: tokio_rusqlite::Error,
    operation_failed: fn(String) -> PersistenceError,
) -> PersistenceError {
    match &err {
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => {
            PersistenceError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(sqlite_err, _))
            if sqlite_err.code == rusqlite::ErrorCode::CannotOpen =>
        {
            PersistenceError::ConnectionFailed(format!("Cannot open database: {err}"))
        }
        _ => operation_failed(err.to_string()),
    }
}

pub fn map_write_error(err: tokio_rusqlite::Error) -> PersistenceError {
    map_error(err, PersistenceError::WriteFailed)
}

pub fn map_delete_error(err: tokio_rusqlite::Error) -> PersistenceError {
    map_error(err, PersistenceError::DeleteFailed)
}

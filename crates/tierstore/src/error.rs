use thiserror::Error;

use tierstore_core::StoreError;

/// Errors returned by [`Store::get`](crate::Store::get).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GetError {
    /// The read emitted an `Error` event.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The event stream ended without data, e.g. because the store shut down.
    #[error("Read ended before producing a value")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, GetError>;

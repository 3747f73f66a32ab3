use thiserror::Error;

/// Errors raised while fetching from the remote layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetcherError {
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Fetched value could not be converted")]
    ConversionFailed,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Fetcher is not available")]
    NilCollaborator,
}

/// Errors raised by the in-memory cache layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cached value could not be converted")]
    ConversionFailed,
    #[error("Cached value failed validation")]
    ValidationFailed,
    #[error("Memory cache is not available")]
    NilCollaborator,
}

/// Errors raised by the source-of-truth layer while reading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceOfTruthError {
    #[error("Stored value could not be converted")]
    ConversionFailed,
    #[error("Stored value failed validation")]
    ValidationFailed,
    #[error("Source of truth is not available")]
    NilCollaborator,
}

/// Error carried by `ReadResponse::Error` events.
///
/// The variant names the layer that failed, the inner error says why.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Fetcher error: {0}")]
    Fetcher(#[from] FetcherError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Source of truth error: {0}")]
    SourceOfTruth(#[from] SourceOfTruthError),
}

impl StoreError {
    /// Shorthand for a fetcher network failure.
    pub fn network(cause: impl Into<String>) -> Self {
        StoreError::Fetcher(FetcherError::NetworkError(cause.into()))
    }

    /// Reports a failed fetch as a network error carrying the cause's message.
    ///
    /// A network error is kept as is instead of being nested.
    pub fn into_network_error(self) -> FetcherError {
        match self {
            StoreError::Fetcher(FetcherError::NetworkError(cause)) => {
                FetcherError::NetworkError(cause)
            }
            other => FetcherError::NetworkError(other.to_string()),
        }
    }
}

/// Errors returned by source-of-truth writes and deletions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Write failed: {0}")]
    WriteFailed(String),
    #[error("Delete failed: {0}")]
    DeleteFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for source-of-truth mutations.
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The layer that produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Origin {
    Cache,
    SourceOfTruth,
    Fetcher { name: Option<String> },
}

impl Origin {
    /// Origin for a fetcher with the given optional name.
    pub fn fetcher(name: Option<String>) -> Self {
        Origin::Fetcher { name }
    }
}

/// One event in the lifecycle of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResponse<O> {
    Initial,
    Loading { origin: Origin },
    Data { value: O, origin: Origin },
    NoNewData { origin: Origin },
    Error { error: StoreError, origin: Origin },
}

impl<O> ReadResponse<O> {
    pub fn loading(origin: Origin) -> Self {
        ReadResponse::Loading { origin }
    }

    pub fn data(value: O, origin: Origin) -> Self {
        ReadResponse::Data { value, origin }
    }

    pub fn error(error: impl Into<StoreError>, origin: Origin) -> Self {
        ReadResponse::Error {
            error: error.into(),
            origin,
        }
    }

    /// Returns the origin, or `None` for `Initial`.
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            ReadResponse::Initial => None,
            ReadResponse::Loading { origin }
            | ReadResponse::Data { origin, .. }
            | ReadResponse::NoNewData { origin }
            | ReadResponse::Error { origin, .. } => Some(origin),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ReadResponse::Loading { .. })
    }

    /// Returns the value carried by a `Data` event.
    pub fn data_ref(&self) -> Option<&O> {
        match self {
            ReadResponse::Data { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<O> {
        match self {
            ReadResponse::Data { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the error carried by an `Error` event.
    pub fn error_ref(&self) -> Option<&StoreError> {
        match self {
            ReadResponse::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn throw_if_error(&self) -> Result<(), StoreError> {
        match self {
            ReadResponse::Error { error, .. } => Err(error.clone()),
            _ => Ok(()),
        }
    }

    /// Human readable message for `Error` events.
    pub fn error_message(&self) -> Option<String> {
        self.error_ref().map(ToString::to_string)
    }

    /// `Data` and `Error` end one pass through the layers; everything else is
    /// progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReadResponse::Data { .. } | ReadResponse::Error { .. } | ReadResponse::NoNewData { .. }
        )
    }
}

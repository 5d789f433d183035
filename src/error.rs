use serde::Serialize;
use thiserror::Error;

/// Coarse failure category. Callers only see it through the HTTP status
/// (401 for `NotAuthenticated`), never through the JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotAuthenticated,
    InvalidInput,
    NotFound,
    StorageUnavailable,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("not found")]
    NotFound,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotAuthenticated => ErrorKind::NotAuthenticated,
            StoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            StoreError::NotFound => ErrorKind::NotFound,
            StoreError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

/// Result shape handed back by every mutating store operation.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
            kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            data: None,
            kind: Some(kind),
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.kind == Some(ErrorKind::NotAuthenticated)
    }
}

impl ActionResult<()> {
    /// Success without a payload; serializes as `{"success": true}`.
    pub fn done() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
            kind: None,
        }
    }
}

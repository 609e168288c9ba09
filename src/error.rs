//! Crate-level error type
//!
//! Each module reports failures through its own error enum. [`Error`] wraps
//! them for operations that span modules, and [`ErrorKind`] sorts every
//! failure into the categories a caller acts on.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before reaching the store
    Validation,
    /// The store refused a duplicate (for example an order number)
    Conflict,
    NotFound,
    /// Network or storage failure that may succeed on a later attempt
    TransientIo,
    /// Export requested before the document was mounted and painted
    RenderNotReady,
    Internal,
}

/// Any error produced by the SDK
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for cross-module operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Store(e) => store_kind(e),
            Error::Export(ExportError::NotReady(_)) => ErrorKind::RenderNotReady,
            Error::Export(ExportError::StoreError(e)) => store_kind(e),
            Error::Export(ExportError::IoError(_)) => ErrorKind::TransientIo,
            Error::Export(_) => ErrorKind::Internal,
            Error::Config(_) => ErrorKind::Internal,
        }
    }

    /// Whether repeating the operation may succeed. Nothing in the SDK
    /// retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientIo
    }
}

fn store_kind(error: &StoreError) -> ErrorKind {
    match error {
        StoreError::NotFound(_) => ErrorKind::NotFound,
        StoreError::Conflict(_) => ErrorKind::Conflict,
        StoreError::Transient(_) => ErrorKind::TransientIo,
        StoreError::Rejected(_) | StoreError::SerializationError(_) | StoreError::Unsupported(_) => {
            ErrorKind::Internal
        }
    }
}

//! Storage error types.

use goes_common::CatalogError;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create S3 client: {0}")]
    Client(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object store request failed for '{key}': {source}")]
    Request {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn request(key: impl Into<String>, source: object_store::Error) -> Self {
        let key = key.into();
        match source {
            object_store::Error::NotFound { .. } => Self::NotFound(key),
            source => Self::Request { key, source },
        }
    }
}

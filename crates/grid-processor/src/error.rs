//! Error types for patch extraction and dataset writing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// The raster is too small for the patch grid.
    #[error("requested region {requested:?} is outside grid bounds {grid:?}")]
    OutOfBounds { requested: String, grid: String },

    /// Patch batches disagree on count or patch shape.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Refusing to overwrite an existing dataset.
    #[error("dataset already exists at {0}")]
    DatasetExists(PathBuf),

    /// Dataset not found or lacks the expected arrays.
    #[error("dataset not found: {0}")]
    NotFound(String),

    /// Invalid metadata in the dataset.
    #[error("invalid dataset metadata: {0}")]
    InvalidMetadata(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    ZarrError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GridProcessorError {
    pub fn out_of_bounds(requested: impl Into<String>, grid: impl Into<String>) -> Self {
        Self::OutOfBounds {
            requested: requested.into(),
            grid: grid.into(),
        }
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    pub fn zarr_error(msg: impl std::fmt::Display) -> Self {
        Self::ZarrError(msg.to_string())
    }

    pub fn storage_error(msg: impl std::fmt::Display) -> Self {
        Self::StorageError(msg.to_string())
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for GridProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;

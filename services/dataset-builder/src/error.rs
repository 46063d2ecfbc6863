//! Error type for the dataset builder.

use goes_common::CatalogError;
use grid_processor::GridProcessorError;
use netcdf_parser::NetCdfError;
use storage::StorageError;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    /// A remote key violated the GOES naming convention.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Decode(#[from] NetCdfError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Dataset(#[from] GridProcessorError),

    /// Every attempt of one batch was abandoned.
    #[error("Gave up on batch {batch} after {attempts} abandoned attempts")]
    RetriesExhausted { batch: usize, attempts: u32 },

    #[error("Timed out after {seconds}s: {what}")]
    Timeout { what: String, seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl BuildError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the attempt should be abandoned and resampled rather
    /// than aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

//! Error types for NetCDF decoding.

use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF decoding.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl NetCdfError {
    pub(crate) fn missing(what: impl Into<String>) -> Self {
        Self::MissingData(what.into())
    }

    pub(crate) fn invalid(what: impl std::fmt::Display) -> Self {
        Self::InvalidFormat(what.to_string())
    }
}

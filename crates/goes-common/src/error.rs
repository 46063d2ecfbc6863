//! Error types for catalog parsing.

use thiserror::Error;

use crate::time::TimeParseError;

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while turning object keys into catalog entries.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The key or filename does not follow the GOES naming convention.
    #[error("Malformed object key '{key}': {reason}")]
    Parse { key: String, reason: String },

    #[error("Invalid timestamp in '{key}': {source}")]
    Timestamp {
        key: String,
        #[source]
        source: TimeParseError,
    },

    #[error("Unknown GOES product: {0}")]
    UnknownProduct(String),
}

impl CatalogError {
    pub fn parse(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that indicate a violated source-format assumption.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Timestamp { .. })
    }
}

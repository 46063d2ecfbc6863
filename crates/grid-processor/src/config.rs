//! Storage settings for the patch dataset.

use serde::{Deserialize, Serialize};

/// Zarr settings for [`PatchDataset`](crate::PatchDataset) arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Compression codec for each chunk (one chunk per sample).
    #[serde(default)]
    pub compression: ZarrCompression,

    /// Compression level (1-9).
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

fn default_compression_level() -> u8 {
    1
}

fn default_shuffle() -> bool {
    true
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            compression: ZarrCompression::BloscZstd,
            compression_level: default_compression_level(),
            shuffle: default_shuffle(),
        }
    }
}

impl DatasetConfig {
    /// Defaults overridden by `DATASET_COMPRESSION`,
    /// `DATASET_COMPRESSION_LEVEL` and `DATASET_SHUFFLE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DATASET_COMPRESSION") {
            config.compression = ZarrCompression::from_str(&val);
        }

        if let Ok(val) = std::env::var("DATASET_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                config.compression_level = level;
            }
        }

        if let Ok(val) = std::env::var("DATASET_SHUFFLE") {
            config.shuffle = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.compression != ZarrCompression::None
            && (self.compression_level == 0 || self.compression_level > 9)
        {
            return Err("compression_level must be 1-9".to_string());
        }
        Ok(())
    }
}

/// Compression codec for Zarr chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZarrCompression {
    None,
    BloscLz4,
    #[default]
    BloscZstd,
}

impl ZarrCompression {
    /// Parse from string (case-insensitive). Unknown names fall back to Blosc/Zstd.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "lz4" | "blosc_lz4" => Self::BloscLz4,
            _ => Self::BloscZstd,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

//! Configuration for the dataset builder.
//!
//! The channel table lives in a YAML file (`config/channels.yaml`):
//!
//! ```yaml
//! channels:
//!   - label: C01
//!     product: ABI-L2-CMIPF
//!     channel: 1
//!     scale: 10000.0
//!     offset: 0.0
//! ```
//!
//! Everything else comes from the command line and environment and is
//! collected into a [`BuilderConfig`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use goes_common::{validate_product, TimeRange};
use grid_processor::{DatasetConfig, PatchGrid};
use serde::{Deserialize, Serialize};
use storage::BucketConfig;
use tracing::info;

use crate::error::{BuildError, BuildResult};

/// Full-disk Cloud and Moisture Imagery, one file per band.
pub const DEFAULT_PRODUCT: &str = "ABI-L2-CMIPF";

/// Highest ABI band number.
pub const ABI_BANDS: u8 = 16;

/// How one dataset label is fetched and quantized.
///
/// Stored values are `round(scale * (value - offset))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub label: String,
    #[serde(default = "default_product")]
    pub product: String,
    /// ABI band; `None` for products that are not split by band.
    #[serde(default)]
    pub channel: Option<u8>,
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
}

fn default_product() -> String {
    DEFAULT_PRODUCT.to_string()
}

impl ChannelConfig {
    pub fn band(band: u8, scale: f64, offset: f64) -> Self {
        Self {
            label: format!("C{:02}", band),
            product: default_product(),
            channel: Some(band),
            scale,
            offset,
        }
    }
}

/// Ordered list of channels; the order is the dataset's label order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTable {
    pub channels: Vec<ChannelConfig>,
}

impl Default for ChannelTable {
    /// All sixteen ABI bands. Reflectance bands (1-6) are stored in units
    /// of 1e-4; emissive bands (7-16) as hundredths of a degree Celsius.
    fn default() -> Self {
        let channels = (1..=ABI_BANDS)
            .map(|band| {
                if band <= 6 {
                    ChannelConfig::band(band, 1e4, 0.0)
                } else {
                    ChannelConfig::band(band, 1e2, 273.15)
                }
            })
            .collect();
        Self { channels }
    }
}

impl ChannelTable {
    pub fn from_yaml(yaml: &str) -> BuildResult<Self> {
        let table: Self = serde_yaml::from_str(yaml)?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_yaml(&self) -> BuildResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: &Path) -> BuildResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        let table = Self::from_yaml(&yaml)?;
        info!(path = %path.display(), channels = table.channels.len(), "Loaded channel table");
        Ok(table)
    }

    /// Load `path` if it exists, otherwise fall back to the built-in table.
    pub fn load_or_default(path: &Path) -> BuildResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "Channel table not found, using built-in defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> BuildResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn labels(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.label.clone()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.label == label)
    }

    pub fn validate(&self) -> BuildResult<()> {
        if self.channels.is_empty() {
            return Err(BuildError::config("channel table is empty"));
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.label.as_str()) {
                return Err(BuildError::config(format!(
                    "duplicate channel label '{}'",
                    channel.label
                )));
            }
            validate_product(&channel.product)?;
            if let Some(band) = channel.channel {
                if band == 0 || band > ABI_BANDS {
                    return Err(BuildError::config(format!(
                        "{}: band {} is outside 1-{}",
                        channel.label, band, ABI_BANDS
                    )));
                }
            }
            if !channel.scale.is_finite() || channel.scale == 0.0 || !channel.offset.is_finite() {
                return Err(BuildError::config(format!(
                    "{}: scale must be finite and non-zero, offset finite",
                    channel.label
                )));
            }
        }
        Ok(())
    }
}

/// Cap on consecutive abandoned attempts within one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 20 }
    }
}

/// Everything one builder run needs.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Dataset directory; must not exist yet.
    pub output: PathBuf,
    pub bucket: BucketConfig,
    pub channels: ChannelTable,
    /// Number of successful attempts to append.
    pub n_batches: usize,
    /// Patches drawn (with replacement) per batch.
    pub n_subsample: usize,
    /// Timestamps are drawn uniformly from this window.
    pub window: TimeRange,
    pub retry: RetryPolicy,
    pub fetch_timeout_secs: u64,
    pub max_concurrent_fetches: usize,
    pub seed: Option<u64>,
    pub grid: PatchGrid,
    pub dataset: DatasetConfig,
}

impl BuilderConfig {
    pub fn new(output: impl Into<PathBuf>, channels: ChannelTable) -> Self {
        Self {
            output: output.into(),
            bucket: BucketConfig::default(),
            channels,
            n_batches: 500,
            n_subsample: 50,
            window: TimeRange::default(),
            retry: RetryPolicy::default(),
            fetch_timeout_secs: 300,
            max_concurrent_fetches: 4,
            seed: None,
            grid: PatchGrid::default(),
            dataset: DatasetConfig::default(),
        }
    }

    /// Per-call timeout for remote requests.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn validate(&self) -> BuildResult<()> {
        self.channels.validate()?;
        self.grid.validate()?;
        self.dataset.validate().map_err(BuildError::Config)?;

        if self.n_subsample == 0 {
            return Err(BuildError::config("n_subsample must be > 0"));
        }
        if self.window.is_empty() {
            return Err(BuildError::config(format!(
                "sampling window {} .. {} is empty",
                self.window.start, self.window.end
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(BuildError::config("max_attempts must be > 0"));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(BuildError::config("max_concurrent_fetches must be > 0"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(BuildError::config("fetch_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

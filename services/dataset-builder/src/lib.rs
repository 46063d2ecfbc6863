//! GOES-16 patch dataset builder.
//!
//! Draws random instants, fetches every configured ABI channel from the
//! public bucket, cuts a fixed grid of patches from each raster and
//! appends a shared random subset of them to a Zarr dataset.

pub mod builder;
pub mod config;
pub mod error;
pub mod fetch;

pub use builder::{create_dataset, BuildSummary, DatasetBuilder};
pub use config::{BuilderConfig, ChannelConfig, ChannelTable, RetryPolicy};
pub use error::{BuildError, BuildResult};
pub use fetch::{GoesFetcher, RasterSource};

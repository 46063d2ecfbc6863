//! Patch extraction and the growable patch dataset.
//!
//! Two stages of the dataset pipeline live here:
//!
//! ```text
//! RasterRecord (f32, rows x cols)
//!      │
//!      ▼
//! PatchGrid::extract  ─► PatchBatch (i16, N x 256 x 256)
//!      │
//!      ▼
//! PatchBatch::select  ─► shared random subset
//!      │
//!      ▼
//! PatchDataset::append ─► Zarr V3 group, one array per channel label
//! ```

pub mod config;
pub mod error;
pub mod patches;
pub mod writer;

pub use config::{DatasetConfig, ZarrCompression};
pub use error::{GridProcessorError, Result};
pub use patches::{extract_patches, quantize, PatchBatch, PatchGrid, PATCH_SIZE};
pub use writer::PatchDataset;

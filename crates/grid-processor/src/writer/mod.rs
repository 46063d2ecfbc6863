//! Zarr V3 storage for accumulated patches.

mod zarr_writer;

pub use zarr_writer::PatchDataset;

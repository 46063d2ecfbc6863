//! NetCDF decoding for GOES-R ABI products.
//!
//! Reads NetCDF-4 files through the native netcdf library (libnetcdf +
//! HDF5) and returns a [`RasterRecord`]: the primary 2-D variable with
//! scale/offset applied, plus the fixed-grid projection parameters from
//! `goes_imager_projection` and the image bounds.
//!
//! ABI products store scan angles in radians; the record keeps bounds in
//! projection-plane meters (scan angle times `perspective_point_height`),
//! which is what geostationary plotting tools expect.

pub mod error;
pub mod native;
pub mod projection;
pub mod record;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{load_raster_from_bytes, load_raster_from_path, silence_hdf5_errors};
pub use projection::GoesProjection;
pub use record::RasterRecord;

//! Synthetic GOES-like rasters.
//!
//! Values follow simple closed-form patterns so tests can check any pixel
//! without keeping a copy of the input around.

use ndarray::Array2;
use netcdf_parser::{GoesProjection, RasterRecord};

/// Full-disk scan angle half-extent (radians) of an ABI 2 km product.
pub const FULL_DISK_BOUND_RAD: f64 = 0.151_872;

/// A grid where `grid[[row, col]] == col * 1000 + row`.
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(5, 10);
/// assert_eq!(grid.dim(), (5, 10));
/// assert_eq!(grid[[0, 1]], 1000.0);
/// assert_eq!(grid[[1, 0]], 1.0);
/// ```
pub fn create_test_grid(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(row, col)| (col * 1000 + row) as f32)
}

/// Reflectance factors in `[0, 1)`, brightening from west to east.
pub fn create_reflectance_grid(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(_, col)| col as f32 / cols.max(1) as f32)
}

/// Brightness temperatures (K) from 200 K at the top to 320 K at the bottom.
pub fn create_brightness_temperature_grid(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(row, _)| {
        200.0 + 120.0 * row as f32 / rows.max(1) as f32
    })
}

/// A constant grid with every `nan_every`-th pixel (row-major) set to NaN.
pub fn create_grid_with_nans(rows: usize, cols: usize, value: f32, nan_every: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let idx = row * cols + col;
        if nan_every > 0 && idx % nan_every == 0 {
            f32::NAN
        } else {
            value
        }
    })
}

/// Wrap an array as a GOES-16 full-disk raster with nominal geometry.
pub fn test_raster(array: Array2<f32>) -> RasterRecord {
    let proj = GoesProjection::default();
    let extent = FULL_DISK_BOUND_RAD * proj.h;
    RasterRecord {
        array,
        variable: "CMI".to_string(),
        lon0: proj.lon0,
        h: proj.h,
        semi_major_axis: proj.semi_major_axis,
        semi_minor_axis: proj.semi_minor_axis,
        xlim: [-extent, extent],
        ylim: [-extent, extent],
        catalog: None,
    }
}

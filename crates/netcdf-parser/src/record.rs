//! Decoded raster plus the geometry needed to place it on the globe.

use goes_common::ProductCatalogEntry;
use ndarray::Array2;

use crate::projection::GoesProjection;

/// One decoded GOES product.
///
/// `array` is indexed `[row, col]` with row 0 at the northern edge. Fill
/// values are NaN. `xlim` and `ylim` are the image bounds in projection-plane
/// meters (scan angle times satellite height); `ylim` is ordered south to
/// north.
#[derive(Debug, Clone)]
pub struct RasterRecord {
    pub array: Array2<f32>,
    /// Name of the primary data variable, e.g. `CMI`
    pub variable: String,
    pub lon0: f64,
    pub h: f64,
    pub semi_major_axis: f64,
    pub semi_minor_axis: f64,
    pub xlim: [f64; 2],
    pub ylim: [f64; 2],
    /// Set when the raster was fetched from the bucket.
    pub catalog: Option<ProductCatalogEntry>,
}

impl RasterRecord {
    /// Attach the catalog entry the raster was downloaded from.
    pub fn with_entry(mut self, entry: ProductCatalogEntry) -> Self {
        self.catalog = Some(entry);
        self
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.array.dim()
    }

    pub fn projection(&self) -> GoesProjection {
        GoesProjection {
            lon0: self.lon0,
            h: self.h,
            semi_major_axis: self.semi_major_axis,
            semi_minor_axis: self.semi_minor_axis,
        }
    }

    /// Projection-plane coordinates (meters) of a pixel center.
    pub fn pixel_to_projection(&self, row: usize, col: usize) -> (f64, f64) {
        let (rows, cols) = self.shape();
        let dx = (self.xlim[1] - self.xlim[0]) / cols as f64;
        let dy = (self.ylim[1] - self.ylim[0]) / rows as f64;
        let x = self.xlim[0] + (col as f64 + 0.5) * dx;
        let y = self.ylim[1] - (row as f64 + 0.5) * dy;
        (x, y)
    }

    /// `(longitude, latitude)` of a pixel center, `None` off the Earth disk.
    pub fn pixel_to_geographic(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        let (x, y) = self.pixel_to_projection(row, col);
        self.projection().meters_to_geographic(x, y)
    }
}

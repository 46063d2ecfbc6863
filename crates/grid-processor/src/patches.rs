//! Fixed-grid patch extraction and quantization.
//!
//! Patches are cut at the same corners from every raster, so patch `k` of
//! one channel covers the same pixels as patch `k` of any other channel
//! decoded on the same fixed grid.

use ndarray::{s, Array2, Array3, Axis};
use netcdf_parser::RasterRecord;
use serde::{Deserialize, Serialize};

use crate::error::{GridProcessorError, Result};

/// Side length of a square patch in pixels.
pub const PATCH_SIZE: usize = 256;

/// First corner offset along each axis.
pub const PATCH_START: usize = 900;

/// Corners stop strictly before this offset.
pub const PATCH_STOP: usize = 4400;

/// Corner layout: offsets `start, start + size, ...` while `< stop`, the
/// same along both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchGrid {
    pub start: usize,
    pub stop: usize,
    pub size: usize,
}

impl Default for PatchGrid {
    fn default() -> Self {
        Self {
            start: PATCH_START,
            stop: PATCH_STOP,
            size: PATCH_SIZE,
        }
    }
}

impl PatchGrid {
    pub fn new(start: usize, stop: usize, size: usize) -> Result<Self> {
        let grid = Self { start, stop, size };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(GridProcessorError::ConfigError(
                "patch size must be > 0".to_string(),
            ));
        }
        if self.start >= self.stop {
            return Err(GridProcessorError::ConfigError(format!(
                "patch grid start {} must be below stop {}",
                self.start, self.stop
            )));
        }
        Ok(())
    }

    /// Corner offsets along one axis.
    pub fn offsets(&self) -> Vec<usize> {
        (self.start..self.stop).step_by(self.size.max(1)).collect()
    }

    /// `(x0, y0)` corners, outer loop over x, inner loop over y.
    pub fn corners(&self) -> Vec<(usize, usize)> {
        let offsets = self.offsets();
        offsets
            .iter()
            .flat_map(|&x0| offsets.iter().map(move |&y0| (x0, y0)))
            .collect()
    }

    /// Number of patches per raster.
    pub fn len(&self) -> usize {
        self.offsets().len().pow(2)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest raster side that fits every patch.
    pub fn required_extent(&self) -> usize {
        self.offsets().last().map_or(0, |last| last + self.size)
    }

    /// Cut and quantize every patch of `array`.
    pub fn extract(&self, array: &Array2<f32>, scale: f64, offset: f64) -> Result<PatchBatch> {
        self.validate()?;

        let (rows, cols) = array.dim();
        let needed = self.required_extent();
        if rows < needed || cols < needed {
            return Err(GridProcessorError::out_of_bounds(
                format!("{}x{} patch grid", needed, needed),
                format!("{}x{} raster", rows, cols),
            ));
        }

        let corners = self.corners();
        let mut patches = Array3::<i16>::zeros((corners.len(), self.size, self.size));

        for (k, &(x0, y0)) in corners.iter().enumerate() {
            let block = array.slice(s![y0..y0 + self.size, x0..x0 + self.size]);
            patches
                .index_axis_mut(Axis(0), k)
                .zip_mut_with(&block, |out, &v| *out = quantize(v, scale, offset));
        }

        Ok(PatchBatch { patches, corners })
    }
}

/// Quantized patches cut from one raster.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchBatch {
    /// `[N, size, size]`
    pub patches: Array3<i16>,
    /// `(x0, y0)` of each patch, in patch order.
    pub corners: Vec<(usize, usize)>,
}

impl PatchBatch {
    pub fn len(&self) -> usize {
        self.patches.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(rows, cols)` of a single patch.
    pub fn patch_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.patches.dim();
        (rows, cols)
    }

    /// Gather patches by index; indices may repeat.
    pub fn select(&self, indices: &[usize]) -> Result<PatchBatch> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(GridProcessorError::out_of_bounds(
                format!("patch index {}", bad),
                format!("{} patches", self.len()),
            ));
        }

        Ok(PatchBatch {
            patches: self.patches.select(Axis(0), indices),
            corners: indices.iter().map(|&i| self.corners[i]).collect(),
        })
    }
}

/// `round(scale * (value - offset))` as `i16`.
///
/// Out-of-range results saturate at the `i16` limits and NaN maps to 0.
pub fn quantize(value: f32, scale: f64, offset: f64) -> i16 {
    (scale * (value as f64 - offset)).round() as i16
}

/// Extract the default 256-pixel patch grid from a decoded raster.
pub fn extract_patches(raster: &RasterRecord, scale: f64, offset: f64) -> Result<PatchBatch> {
    PatchGrid::default().extract(&raster.array, scale, offset)
}

//! Quick-look previews of rasters and patches.
//!
//! Values are linearly stretched between the finite minimum and maximum
//! to 0..=255. Non-finite pixels render black. Large rasters are
//! decimated by an integer stride so the longer side fits `max_dim`.

use ndarray::{s, Array2, ArrayView2};
use rayon::prelude::*;

use crate::png::{create_png_gray, create_png_rgb};

/// Outline color of the patch grid overlay.
const OVERLAY_RGB: [u8; 3] = [255, 0, 0];

/// Linear min/max stretch to 8 bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stretch {
    pub min: f32,
    pub max: f32,
}

impl Stretch {
    /// Range of the finite values, `None` if there are none.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a f32>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Self>, &v| match acc {
                None => Some(Self { min: v, max: v }),
                Some(s) => Some(Self {
                    min: s.min.min(v),
                    max: s.max.max(v),
                }),
            })
    }

    pub fn apply(&self, value: f32) -> u8 {
        if !value.is_finite() {
            return 0;
        }
        let range = self.max - self.min;
        if range <= 0.0 {
            return 128;
        }
        ((value - self.min) / range * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

/// Stride that brings the longer side down to at most `max_dim`.
pub fn decimation(rows: usize, cols: usize, max_dim: usize) -> usize {
    let longest = rows.max(cols);
    if max_dim == 0 || longest <= max_dim {
        1
    } else {
        longest.div_ceil(max_dim)
    }
}

/// Grayscale bytes of a (decimated) raster: `(pixels, width, height)`.
pub fn grayscale(array: ArrayView2<'_, f32>, stride: usize) -> (Vec<u8>, usize, usize) {
    let view = array.slice(s![..;stride, ..;stride]);
    let (height, width) = view.dim();

    let stretch = Stretch::from_values(view.iter()).unwrap_or(Stretch { min: 0.0, max: 0.0 });

    let mut pixels = vec![0u8; width * height];
    if width > 0 {
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out)| {
                for (px, v) in out.iter_mut().zip(view.row(row).iter()) {
                    *px = stretch.apply(*v);
                }
            });
    }

    (pixels, width, height)
}

/// Grayscale PNG of a whole raster.
pub fn render_raster_preview(array: &Array2<f32>, max_dim: usize) -> Result<Vec<u8>, String> {
    let (rows, cols) = array.dim();
    let (pixels, width, height) = grayscale(array.view(), decimation(rows, cols, max_dim));
    create_png_gray(&pixels, width, height)
}

/// Grayscale PNG of one quantized patch.
pub fn render_patch_preview(patch: ArrayView2<'_, i16>) -> Result<Vec<u8>, String> {
    let values = patch.mapv(f32::from);
    let (pixels, width, height) = grayscale(values.view(), 1);
    create_png_gray(&pixels, width, height)
}

/// RGB PNG of a raster with the outline of every patch drawn on top.
///
/// `corners` are `(x0, y0)` in full-resolution pixels.
pub fn render_patch_grid_overlay(
    array: &Array2<f32>,
    corners: &[(usize, usize)],
    patch_size: usize,
    max_dim: usize,
) -> Result<Vec<u8>, String> {
    let (rows, cols) = array.dim();
    let stride = decimation(rows, cols, max_dim);
    let (gray, width, height) = grayscale(array.view(), stride);

    let mut rgb: Vec<u8> = gray.iter().flat_map(|&g| [g, g, g]).collect();
    let mut paint = |x: usize, y: usize| {
        if x < width && y < height {
            let idx = (y * width + x) * 3;
            rgb[idx..idx + 3].copy_from_slice(&OVERLAY_RGB);
        }
    };

    for &(x0, y0) in corners {
        let left = x0 / stride;
        let top = y0 / stride;
        let right = (x0 + patch_size).saturating_sub(1) / stride;
        let bottom = (y0 + patch_size).saturating_sub(1) / stride;

        for x in left..=right {
            paint(x, top);
            paint(x, bottom);
        }
        for y in top..=bottom {
            paint(left, y);
            paint(right, y);
        }
    }

    create_png_rgb(&rgb, width, height)
}

//! Image rendering for quick-look inspection of GOES rasters and patches.
//!
//! - Grayscale min/max stretch of full rasters (decimated to a size cap)
//! - Single-patch previews of quantized data
//! - Patch grid overlay on top of a raster
//! - A small PNG encoder (grayscale and RGB)

pub mod png;
pub mod preview;

pub use png::{create_png_gray, create_png_rgb};
pub use preview::{
    render_patch_grid_overlay, render_patch_preview, render_raster_preview, Stretch,
};

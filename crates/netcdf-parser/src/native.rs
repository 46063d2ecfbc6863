//! NetCDF decoding through the native netcdf library.
//!
//! libnetcdf needs a file path, so byte buffers are spilled to a temp file
//! first. On Linux the temp file goes to `/dev/shm` (memory-backed tmpfs)
//! when it is writable.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

use ndarray::Array2;
use tracing::{debug, instrument};

use crate::error::{NetCdfError, NetCdfResult};
use crate::record::RasterRecord;

const PROJECTION_VAR: &str = "goes_imager_projection";
const X_BOUNDS_VAR: &str = "x_image_bounds";
const Y_BOUNDS_VAR: &str = "y_image_bounds";

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 reports every failed lookup (e.g. probing an optional attribute)
/// on stderr even when the caller handles it. Call once early in `main`,
/// before any NetCDF file is opened; repeated calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 with a null handler is the documented way to
        // turn automatic error printing off.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Decode a GOES product held in memory.
#[instrument(skip(data), fields(size = data.len()))]
pub fn load_raster_from_bytes(data: &[u8]) -> NetCdfResult<RasterRecord> {
    let mut temp = tempfile::Builder::new()
        .prefix("goes_native_")
        .suffix(".nc")
        .tempfile_in(get_optimal_temp_dir())?;
    temp.write_all(data)?;
    temp.flush()?;

    // The temp file is removed when `temp` drops.
    load_raster_from_path(temp.path())
}

/// Decode a GOES product from disk.
///
/// The primary array is the first two-dimensional variable in the file.
/// `scale_factor`/`add_offset` are applied, `_Unsigned` shorts are widened
/// and `_FillValue` pixels become NaN.
#[instrument(fields(path = %path.display()))]
pub fn load_raster_from_path(path: &Path) -> NetCdfResult<RasterRecord> {
    silence_hdf5_errors();

    let file = netcdf::open(path)
        .map_err(|e| NetCdfError::invalid(format!("Failed to open NetCDF: {}", e)))?;

    let var = file
        .variables()
        .find(|v| v.dimensions().len() == 2)
        .ok_or_else(|| NetCdfError::missing("two-dimensional data variable"))?;
    let variable = var.name();
    let rows = var.dimensions()[0].len();
    let cols = var.dimensions()[1].len();

    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::invalid(format!("Failed to read {}: {}", variable, e)))?;

    let scale = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);
    let fill = get_f64_attr(&var, "_FillValue");
    let unsigned = get_str_attr(&var, "_Unsigned").is_some_and(|s| s.eq_ignore_ascii_case("true"));

    let values: Vec<f32> = raw
        .into_iter()
        .map(|v| {
            if fill == Some(v) || v.is_nan() {
                return f32::NAN;
            }
            let v = if unsigned && v < 0.0 { v + 65_536.0 } else { v };
            (v * scale + offset) as f32
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), values)
        .map_err(|e| NetCdfError::invalid(format!("{} shape: {}", variable, e)))?;

    let proj = file
        .variable(PROJECTION_VAR)
        .ok_or_else(|| NetCdfError::missing(format!("{} variable", PROJECTION_VAR)))?;
    let require = |name: &str| {
        get_f64_attr(&proj, name)
            .ok_or_else(|| NetCdfError::missing(format!("{}:{}", PROJECTION_VAR, name)))
    };
    let lon0 = require("longitude_of_projection_origin")?;
    let h = require("perspective_point_height")?;
    let semi_major_axis = require("semi_major_axis")?;
    let semi_minor_axis = require("semi_minor_axis")?;

    let x_bounds = read_bounds(&file, X_BOUNDS_VAR)?;
    let y_bounds = read_bounds(&file, Y_BOUNDS_VAR)?;

    debug!(variable = %variable, rows, cols, lon0, "Decoded raster");

    Ok(RasterRecord {
        array,
        variable,
        lon0,
        h,
        semi_major_axis,
        semi_minor_axis,
        xlim: [h * x_bounds[0], h * x_bounds[1]],
        // y bounds are stored north first
        ylim: [h * y_bounds[1], h * y_bounds[0]],
        catalog: None,
    })
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Prefer `/dev/shm` when writable, else the system temp directory.
fn get_optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm_path = Path::new("/dev/shm");
        if shm_path.is_dir() {
            let probe = shm_path.join(format!(".netcdf_probe_{}", std::process::id()));
            if std::fs::write(&probe, b"probe").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return shm_path.to_path_buf();
            }
        }
    }

    std::env::temp_dir()
}

fn read_bounds(file: &netcdf::File, name: &str) -> NetCdfResult<[f64; 2]> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::missing(format!("{} variable", name)))?;
    let values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::invalid(format!("Failed to read {}: {}", name, e)))?;

    match values.as_slice() {
        [first, second] => Ok([*first, *second]),
        other => Err(NetCdfError::invalid(format!(
            "{} has {} values, expected 2",
            name,
            other.len()
        ))),
    }
}

/// Avoids HDF5 lookups of attributes that are not there.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

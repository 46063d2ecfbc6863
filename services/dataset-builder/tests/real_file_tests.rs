//! Decode and cut a real full-disk product when one is available locally.
//!
//! Set `TEST_DATA_DIR` or drop the file into `testdata/` to run these.

use grid_processor::extract_patches;
use netcdf_parser::load_raster_from_path;
use test_utils::{assert_approx_eq, require_test_file};

const C13_FULL_DISK: &str =
    "OR_ABI-L2-CMIPF-M6C13_G16_s20201230300216_e20201230309536_c20201230310018.nc";

#[test]
fn test_real_full_disk_c13() {
    let path = require_test_file!(C13_FULL_DISK);

    let raster = load_raster_from_path(&path).unwrap();
    assert_eq!(raster.variable, "CMI");
    assert_eq!(raster.shape(), (5424, 5424));
    assert_approx_eq!(raster.lon0, -75.0, 1e-6);
    assert_approx_eq!(raster.h, 35_786_023.0, 1.0);
    assert!(raster.ylim[0] < raster.ylim[1]);

    // the sub-satellite point is on the disk and close to lon0
    let (lon, lat) = raster.pixel_to_geographic(2712, 2712).unwrap();
    assert_approx_eq!(lon, -75.0, 0.1);
    assert_approx_eq!(lat, 0.0, 0.1);

    let batch = extract_patches(&raster, 1e2, 273.15).unwrap();
    assert_eq!(batch.len(), 196);
    assert_eq!(batch.patch_shape(), (256, 256));
    // hundredths of a degree Celsius, roughly -120 C to +80 C
    assert!(batch.patches.iter().all(|&v| (-12_000..=8_000).contains(&v)));
}

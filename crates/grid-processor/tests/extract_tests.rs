//! Patch extraction on synthetic rasters.

use grid_processor::{extract_patches, quantize, GridProcessorError, PatchGrid};
use test_utils::{create_grid_with_nans, create_reflectance_grid, create_test_grid, test_raster};

#[test]
fn test_reflectance_quantization() {
    // reflectance = col / 32
    let array = create_reflectance_grid(32, 32);
    let grid = PatchGrid::new(4, 28, 8).unwrap();
    let batch = grid.extract(&array, 1e4, 0.0).unwrap();

    assert_eq!(batch.len(), 9);
    // patch 3 is the second x column: x0 = 12, y0 = 4
    assert_eq!(batch.corners[3], (12, 4));
    assert_eq!(batch.patches[[3, 0, 0]], 3750);
    assert_eq!(batch.patches[[3, 5, 7]], 5938);
}

#[test]
fn test_nan_pixels_become_zero() {
    let array = create_grid_with_nans(16, 16, 300.0, 3);
    let grid = PatchGrid::new(0, 16, 4).unwrap();
    let batch = grid.extract(&array, 1e2, 273.15).unwrap();

    // pixel (0, 0) is NaN, (0, 1) is 300 K
    assert_eq!(batch.patches[[0, 0, 0]], 0);
    assert_eq!(batch.patches[[0, 0, 1]], 2685);
}

#[test]
fn test_raster_too_small() {
    let array = create_reflectance_grid(20, 40);
    let grid = PatchGrid::new(4, 28, 8).unwrap();
    assert!(matches!(
        grid.extract(&array, 1e4, 0.0),
        Err(GridProcessorError::OutOfBounds { .. })
    ));
}

#[test]
fn test_full_disk_raster_gives_default_grid() {
    // value = col * 1000 + row, so scale 1e-3 stores col + row / 1000
    let raster = test_raster(create_test_grid(4656, 4656));
    let batch = extract_patches(&raster, 1e-3, 0.0).unwrap();

    assert_eq!(batch.patches.dim(), (196, 256, 256));
    assert_eq!(batch.corners.len(), 196);
    assert_eq!(batch.corners[0], (900, 900));
    assert_eq!(batch.corners[1], (900, 1156));
    assert_eq!(batch.corners[195], (4228, 4228));

    // first patch: (x, y) = (900, 900) and (1155, 1155)
    assert_eq!(batch.patches[[0, 0, 0]], 901);
    assert_eq!(batch.patches[[0, 255, 255]], 1155);
    // last patch: (4228, 4228) and (4483, 4483)
    assert_eq!(batch.patches[[195, 0, 0]], 4228);
    assert_eq!(batch.patches[[195, 255, 255]], 4483);

    for (k, &(x0, y0)) in batch.corners.iter().enumerate().step_by(13) {
        for (i, j) in [(0, 0), (17, 200), (128, 64), (255, 0)] {
            let v = raster.array[[y0 + i, x0 + j]];
            assert_eq!(batch.patches[[k, i, j]], quantize(v, 1e-3, 0.0), "patch {} ({}, {})", k, i, j);
        }
    }
}

#[test]
fn test_extraction_is_repeatable() {
    let raster = test_raster(create_test_grid(4656, 4656));
    let first = extract_patches(&raster, 1e-3, 0.0).unwrap();
    let second = extract_patches(&raster, 1e-3, 0.0).unwrap();
    assert_eq!(first, second);
}

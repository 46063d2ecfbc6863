//! Integration test: extract patches, append them to a Zarr dataset, reopen
//! it and read the samples back.

use grid_processor::{
    DatasetConfig, GridProcessorError, PatchBatch, PatchDataset, PatchGrid, ZarrCompression,
};
use ndarray::Axis;
use test_utils::{create_brightness_temperature_grid, create_test_grid, test_raster};

fn labels() -> Vec<String> {
    vec!["C07".to_string(), "C13".to_string()]
}

fn small_grid() -> PatchGrid {
    PatchGrid::new(4, 28, 8).unwrap()
}

fn batches(grid: &PatchGrid, indices: &[usize]) -> Vec<(String, PatchBatch)> {
    let ir = test_raster(create_brightness_temperature_grid(32, 32));
    let pattern = test_raster(create_test_grid(32, 32));

    vec![
        (
            "C07".to_string(),
            grid.extract(&ir.array, 1e2, 273.15).unwrap().select(indices).unwrap(),
        ),
        (
            "C13".to_string(),
            grid.extract(&pattern.array, 1.0, 0.0).unwrap().select(indices).unwrap(),
        ),
    ]
}

fn roundtrip(config: DatasetConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patches.zarr");
    let grid = small_grid();

    let mut attrs = serde_json::Map::new();
    attrs.insert("source".to_string(), serde_json::json!("synthetic"));
    let mut dataset = PatchDataset::create(&path, &labels(), grid.size, &config, attrs).unwrap();
    assert!(dataset.is_empty());

    let first = batches(&grid, &[0, 4, 4]);
    assert_eq!(dataset.append(&first).unwrap(), 3);

    // batches in a different order than the labels
    let mut second = batches(&grid, &[8]);
    second.reverse();
    assert_eq!(dataset.append(&second).unwrap(), 4);
    drop(dataset);

    let reopened = PatchDataset::open(&path).unwrap();
    assert_eq!(reopened.len(), 4);
    assert_eq!(reopened.labels(), vec!["C07", "C13"]);
    assert_eq!(reopened.patch_size(), 8);

    for (label, batch) in &first {
        for (i, expected) in batch.patches.axis_iter(Axis(0)).enumerate() {
            let stored = reopened.read_sample(label, i as u64).unwrap();
            assert_eq!(stored.view(), expected, "{} sample {}", label, i);
        }
    }

    // patch 8 of the 3x3 grid starts at x0 = 20, y0 = 20
    let last = reopened.read_sample("C13", 3).unwrap();
    assert_eq!(last[[0, 0]], 20_020);
    assert_eq!(last[[7, 1]], 21_027);

    assert!(matches!(
        reopened.read_sample("C13", 4),
        Err(GridProcessorError::OutOfBounds { .. })
    ));
    assert!(reopened.read_sample("C02", 0).is_err());
}

#[test]
fn test_roundtrip_uncompressed() {
    roundtrip(DatasetConfig {
        compression: ZarrCompression::None,
        compression_level: 0,
        shuffle: false,
    });
}

#[test]
fn test_roundtrip_blosc_zstd() {
    roundtrip(DatasetConfig::default());
}

#[test]
fn test_roundtrip_blosc_lz4() {
    roundtrip(DatasetConfig {
        compression: ZarrCompression::BloscLz4,
        compression_level: 5,
        shuffle: true,
    });
}

#[test]
fn test_create_then_create_again_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patches.zarr");
    let config = DatasetConfig::default();

    PatchDataset::create(&path, &labels(), 8, &config, serde_json::Map::new()).unwrap();
    let err = PatchDataset::create(&path, &labels(), 8, &config, serde_json::Map::new()).unwrap_err();
    assert!(matches!(err, GridProcessorError::DatasetExists(_)));

    // the first dataset is untouched
    assert_eq!(PatchDataset::open(&path).unwrap().len(), 0);
}

#[test]
fn test_open_missing_dataset() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PatchDataset::open(&dir.path().join("nope.zarr")),
        Err(GridProcessorError::NotFound(_))
    ));
}

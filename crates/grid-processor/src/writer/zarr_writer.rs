//! Growable Zarr V3 patch dataset.
//!
//! Layout: a group at the dataset root and one `int16` array per channel
//! label, shape `[samples, size, size]`, chunked one sample per chunk. The
//! leading dimension grows on every append and is equal across arrays after
//! each successful append.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array2;
use tracing::{debug, info, instrument, warn};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::{Group, GroupBuilder};
use zarrs_filesystem::FilesystemStore;

use crate::config::{DatasetConfig, ZarrCompression};
use crate::error::{GridProcessorError, Result};
use crate::patches::PatchBatch;

const LABELS_ATTR: &str = "labels";
const PATCH_SIZE_ATTR: &str = "patch_size";

/// An on-disk dataset with one growable patch array per channel label.
pub struct PatchDataset {
    path: PathBuf,
    patch_size: usize,
    arrays: Vec<(String, Array<FilesystemStore>)>,
    len: u64,
}

impl std::fmt::Debug for PatchDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchDataset")
            .field("path", &self.path)
            .field("patch_size", &self.patch_size)
            .field("labels", &self.labels())
            .field("len", &self.len)
            .finish()
    }
}

impl PatchDataset {
    /// Create an empty dataset at `path`.
    ///
    /// Fails with [`GridProcessorError::DatasetExists`] if anything already
    /// exists at `path`; nothing is written in that case. `attributes` are
    /// stored on the root group alongside the label list.
    #[instrument(skip(config, attributes), fields(path = %path.display()))]
    pub fn create(
        path: &Path,
        labels: &[String],
        patch_size: usize,
        config: &DatasetConfig,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        if path.exists() {
            return Err(GridProcessorError::DatasetExists(path.to_path_buf()));
        }
        if labels.is_empty() {
            return Err(GridProcessorError::ConfigError(
                "dataset needs at least one label".to_string(),
            ));
        }
        if patch_size == 0 {
            return Err(GridProcessorError::ConfigError(
                "patch size must be > 0".to_string(),
            ));
        }
        config.validate().map_err(GridProcessorError::ConfigError)?;
        for label in labels {
            validate_label(label)?;
        }

        std::fs::create_dir_all(path)?;
        let store = Arc::new(FilesystemStore::new(path).map_err(GridProcessorError::storage_error)?);

        let mut group_attrs = attributes;
        group_attrs.insert(LABELS_ATTR.to_string(), serde_json::json!(labels));
        group_attrs.insert(PATCH_SIZE_ATTR.to_string(), serde_json::json!(patch_size));
        group_attrs.insert(
            "compression".to_string(),
            serde_json::json!(config.compression.as_str()),
        );

        let group = GroupBuilder::new()
            .attributes(group_attrs)
            .build(store.clone(), "/")
            .map_err(GridProcessorError::zarr_error)?;
        group
            .store_metadata()
            .map_err(GridProcessorError::storage_error)?;

        let mut arrays = Vec::with_capacity(labels.len());
        for label in labels {
            let array = build_array(store.clone(), label, patch_size, config)?;
            array
                .store_metadata()
                .map_err(GridProcessorError::storage_error)?;
            arrays.push((label.clone(), array));
        }

        info!(labels = labels.len(), patch_size, "Created patch dataset");

        Ok(Self {
            path: path.to_path_buf(),
            patch_size,
            arrays,
            len: 0,
        })
    }

    /// Open an existing dataset.
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(GridProcessorError::NotFound(path.display().to_string()));
        }
        let store = Arc::new(FilesystemStore::new(path).map_err(GridProcessorError::storage_error)?);

        let group = Group::open(store.clone(), "/").map_err(GridProcessorError::zarr_error)?;
        let attrs = group.attributes();

        let labels: Vec<String> = serde_json::from_value(
            attrs
                .get(LABELS_ATTR)
                .cloned()
                .ok_or_else(|| GridProcessorError::invalid_metadata("missing labels"))?,
        )?;
        let patch_size: usize = serde_json::from_value(
            attrs
                .get(PATCH_SIZE_ATTR)
                .cloned()
                .ok_or_else(|| GridProcessorError::invalid_metadata("missing patch_size"))?,
        )?;

        let mut arrays = Vec::with_capacity(labels.len());
        let mut len = None;
        for label in labels {
            let array = Array::open(store.clone(), &array_path(&label))
                .map_err(|e| GridProcessorError::NotFound(format!("{}: {}", label, e)))?;

            let samples = array.shape().first().copied().unwrap_or(0);
            match len {
                None => len = Some(samples),
                Some(expected) if expected != samples => {
                    return Err(GridProcessorError::invalid_metadata(format!(
                        "array {} has {} samples, expected {}",
                        label, samples, expected
                    )));
                }
                Some(_) => {}
            }
            arrays.push((label, array));
        }

        Ok(Self {
            path: path.to_path_buf(),
            patch_size,
            arrays,
            len: len.unwrap_or(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    pub fn labels(&self) -> Vec<&str> {
        self.arrays.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Samples per array.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append one batch per label. Returns the new length.
    ///
    /// Every label must be present exactly once and all batches must hold
    /// the same number of `patch_size` patches. Shapes are checked before
    /// anything is written.
    ///
    /// Chunks for every label are written before any array metadata grows,
    /// so a failed write leaves every array at the previous length. Chunks
    /// already written past that length are unreachable and are overwritten
    /// by the next append.
    #[instrument(skip(self, batches), fields(path = %self.path.display(), len = self.len))]
    pub fn append(&mut self, batches: &[(String, PatchBatch)]) -> Result<u64> {
        let ordered = self.match_batches(batches)?;
        let count = ordered.first().map_or(0, |batch| batch.len()) as u64;
        if count == 0 {
            return Ok(self.len);
        }

        let size = self.patch_size as u64;
        let old_len = self.len;
        let new_len = old_len + count;
        let subset = ArraySubset::new_with_start_shape(vec![old_len, 0, 0], vec![count, size, size])
            .map_err(GridProcessorError::storage_error)?;

        let written = self.write_chunks(&ordered, &subset, new_len);
        if let Err(e) = written {
            self.reset_shapes(old_len);
            return Err(e);
        }

        for index in 0..self.arrays.len() {
            if let Err(e) = self.arrays[index].1.store_metadata() {
                // Shrink the arrays that were already grown on disk.
                self.reset_shapes(old_len);
                for (label, array) in &self.arrays[..index] {
                    if let Err(rollback) = array.store_metadata() {
                        warn!(label = %label, error = %rollback, "Failed to roll back array metadata");
                    }
                }
                return Err(GridProcessorError::storage_error(e));
            }
        }

        self.len = new_len;
        Ok(new_len)
    }

    /// Grow each array in memory and store its chunks for `subset`.
    fn write_chunks(&mut self, ordered: &[&PatchBatch], subset: &ArraySubset, new_len: u64) -> Result<()> {
        let size = self.patch_size as u64;
        for ((label, array), batch) in self.arrays.iter_mut().zip(ordered) {
            array.set_shape(vec![new_len, size, size]);

            let data: Vec<i16> = batch.patches.iter().copied().collect();
            array
                .store_array_subset_elements(subset, &data)
                .map_err(GridProcessorError::storage_error)?;

            debug!(label = %label, samples = new_len, "Wrote patch chunks");
        }
        Ok(())
    }

    fn reset_shapes(&mut self, len: u64) {
        let size = self.patch_size as u64;
        for (_, array) in &mut self.arrays {
            array.set_shape(vec![len, size, size]);
        }
    }

    /// Read one stored patch.
    pub fn read_sample(&self, label: &str, index: u64) -> Result<Array2<i16>> {
        let array = self
            .arrays
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, array)| array)
            .ok_or_else(|| GridProcessorError::NotFound(format!("label {}", label)))?;

        if index >= self.len {
            return Err(GridProcessorError::out_of_bounds(
                format!("sample {}", index),
                format!("{} samples", self.len),
            ));
        }

        let size = self.patch_size as u64;
        let subset = ArraySubset::new_with_start_shape(vec![index, 0, 0], vec![1, size, size])
            .map_err(GridProcessorError::storage_error)?;
        let data: Vec<i16> = array
            .retrieve_array_subset_elements(&subset)
            .map_err(GridProcessorError::zarr_error)?;

        Array2::from_shape_vec((self.patch_size, self.patch_size), data)
            .map_err(GridProcessorError::zarr_error)
    }

    /// Batches in dataset label order, validated for shape.
    fn match_batches<'a>(&self, batches: &'a [(String, PatchBatch)]) -> Result<Vec<&'a PatchBatch>> {
        if batches.len() != self.arrays.len() {
            return Err(GridProcessorError::shape_mismatch(format!(
                "got {} batches for {} labels",
                batches.len(),
                self.arrays.len()
            )));
        }

        let mut ordered = Vec::with_capacity(self.arrays.len());
        for (label, _) in &self.arrays {
            let batch = batches
                .iter()
                .find(|(name, _)| name == label)
                .map(|(_, batch)| batch)
                .ok_or_else(|| GridProcessorError::shape_mismatch(format!("no batch for {}", label)))?;

            if batch.patch_shape() != (self.patch_size, self.patch_size) {
                return Err(GridProcessorError::shape_mismatch(format!(
                    "{} patches are {:?}, dataset stores {}x{}",
                    label,
                    batch.patch_shape(),
                    self.patch_size,
                    self.patch_size
                )));
            }
            if let Some(first) = ordered.first().map(|b: &&PatchBatch| b.len()) {
                if batch.len() != first {
                    return Err(GridProcessorError::shape_mismatch(format!(
                        "{} has {} patches, expected {}",
                        label,
                        batch.len(),
                        first
                    )));
                }
            }
            ordered.push(batch);
        }
        Ok(ordered)
    }
}

fn array_path(label: &str) -> String {
    format!("/{}", label)
}

/// Labels become Zarr node names.
fn validate_label(label: &str) -> Result<()> {
    let valid = !label.is_empty()
        && !label.starts_with("__")
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && label != "."
        && label != "..";
    if valid {
        Ok(())
    } else {
        Err(GridProcessorError::ConfigError(format!(
            "invalid dataset label '{}'",
            label
        )))
    }
}

fn build_array(
    store: Arc<FilesystemStore>,
    label: &str,
    patch_size: usize,
    config: &DatasetConfig,
) -> Result<Array<FilesystemStore>> {
    let size = patch_size as u64;
    let chunk_grid: zarrs::array::ChunkGrid = vec![1, size, size]
        .try_into()
        .map_err(|e| GridProcessorError::ConfigError(format!("{:?}", e)))?;

    let mut attrs = serde_json::Map::new();
    attrs.insert("label".to_string(), serde_json::json!(label));
    attrs.insert("dimensions".to_string(), serde_json::json!(["sample", "y", "x"]));

    let mut binding = ArrayBuilder::new(
        vec![0, size, size],
        DataType::Int16,
        chunk_grid,
        FillValue::from(0i16),
    );
    let mut builder = binding.attributes(attrs);

    if config.compression != ZarrCompression::None {
        builder = builder.bytes_to_bytes_codecs(vec![compression_codec(config)?]);
    }

    builder
        .build(store, &array_path(label))
        .map_err(GridProcessorError::zarr_error)
}

fn compression_codec(
    config: &DatasetConfig,
) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
    let level = BloscCompressionLevel::try_from(config.compression_level)
        .map_err(|_| GridProcessorError::ConfigError("Invalid compression level".to_string()))?;

    let (shuffle, typesize) = if config.shuffle {
        (BloscShuffleMode::Shuffle, Some(std::mem::size_of::<i16>()))
    } else {
        (BloscShuffleMode::NoShuffle, None)
    };

    let compressor = match config.compression {
        ZarrCompression::None => {
            return Err(GridProcessorError::ConfigError(
                "No compression configured".to_string(),
            ))
        }
        ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
        ZarrCompression::BloscZstd => BloscCompressor::Zstd,
    };

    let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
        .map_err(|e| GridProcessorError::ConfigError(e.to_string()))?;

    Ok(Arc::new(codec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn batch(count: usize, size: usize, value: i16) -> PatchBatch {
        PatchBatch {
            patches: Array3::from_elem((count, size, size), value),
            corners: vec![(0, 0); count],
        }
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("C01").is_ok());
        assert!(validate_label("cloud-mask_v2").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("a/b").is_err());
        assert!(validate_label("__zarr").is_err());
    }

    #[test]
    fn test_create_refuses_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = PatchDataset::create(
            dir.path(),
            &labels(&["C01"]),
            4,
            &DatasetConfig::default(),
            serde_json::Map::new(),
        )
        .unwrap_err();
        assert!(matches!(err, GridProcessorError::DatasetExists(_)));
    }

    #[test]
    fn test_append_rejects_mismatched_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ds.zarr");
        let mut ds = PatchDataset::create(
            &path,
            &labels(&["C01", "C02"]),
            4,
            &DatasetConfig::default(),
            serde_json::Map::new(),
        )
        .unwrap();

        let missing = vec![("C01".to_string(), batch(2, 4, 1))];
        assert!(ds.append(&missing).is_err());

        let uneven = vec![
            ("C01".to_string(), batch(2, 4, 1)),
            ("C02".to_string(), batch(3, 4, 1)),
        ];
        assert!(ds.append(&uneven).is_err());

        let wrong_size = vec![
            ("C01".to_string(), batch(2, 4, 1)),
            ("C02".to_string(), batch(2, 5, 1)),
        ];
        assert!(ds.append(&wrong_size).is_err());

        assert_eq!(ds.len(), 0);
    }

    #[test]
    fn test_failed_write_keeps_arrays_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ds.zarr");
        let config = DatasetConfig {
            compression: ZarrCompression::None,
            compression_level: 0,
            shuffle: false,
        };
        let mut ds = PatchDataset::create(&path, &labels(&["C01", "C02"]), 4, &config, serde_json::Map::new())
            .unwrap();

        let two = |value| {
            vec![
                ("C01".to_string(), batch(2, 4, value)),
                ("C02".to_string(), batch(2, 4, value)),
            ]
        };
        assert_eq!(ds.append(&two(3)).unwrap(), 2);

        // A file where C02's chunk directory for sample 2 would go makes
        // that label's write fail after C01's chunks are already stored.
        let blocker = path.join("C02").join("c").join("2");
        std::fs::write(&blocker, b"").unwrap();

        assert!(ds.append(&two(5)).is_err());
        assert_eq!(ds.len(), 2);

        let reopened = PatchDataset::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.read_sample("C01", 2).is_err());

        // Once the cause is gone the next append lands at the same offset.
        std::fs::remove_file(&blocker).unwrap();
        assert_eq!(ds.append(&two(7)).unwrap(), 4);

        let reopened = PatchDataset::open(&path).unwrap();
        assert_eq!(reopened.len(), 4);
        for label in ["C01", "C02"] {
            assert_eq!(reopened.read_sample(label, 1).unwrap()[[0, 0]], 3);
            assert_eq!(reopened.read_sample(label, 2).unwrap()[[0, 0]], 7);
        }
    }
}

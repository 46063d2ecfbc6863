//! The accumulation loop.
//!
//! Each batch draws a random instant, fetches every configured channel at
//! that instant, cuts the same patch grid from each raster, draws one set
//! of patch indices (with replacement) and appends that subset of every
//! channel to the dataset. An attempt with any channel missing is dropped
//! whole and a new instant is drawn.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use grid_processor::{GridProcessorError, PatchBatch, PatchDataset};
use netcdf_parser::RasterRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::config::BuilderConfig;
use crate::error::{BuildError, BuildResult};
use crate::fetch::RasterSource;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub batches: usize,
    /// Dataset length after the last append.
    pub samples: u64,
    pub abandoned_attempts: u32,
}

/// Outcome of a single attempt.
enum Attempt {
    Complete(Vec<(String, PatchBatch)>),
    Abandoned(String),
}

/// Rasters for one instant, or the first channel that had none.
enum Fetched {
    All(Vec<RasterRecord>),
    Missing(String),
}

/// Create the empty output dataset.
///
/// Fails with [`GridProcessorError::DatasetExists`] when the output
/// path is taken. Call this before any remote request.
pub fn create_dataset(config: &BuilderConfig) -> BuildResult<PatchDataset> {
    config.validate()?;

    let channels = serde_json::to_value(&config.channels.channels)
        .map_err(|e| BuildError::config(e.to_string()))?;
    let mut attributes = serde_json::Map::new();
    attributes.insert("channels".to_string(), channels);
    attributes.insert(
        "patch_grid".to_string(),
        serde_json::json!({
            "start": config.grid.start,
            "stop": config.grid.stop,
            "size": config.grid.size,
        }),
    );
    attributes.insert(
        "window".to_string(),
        serde_json::json!({
            "start": config.window.start.to_rfc3339(),
            "end": config.window.end.to_rfc3339(),
        }),
    );
    attributes.insert("n_subsample".to_string(), serde_json::json!(config.n_subsample));
    attributes.insert("bucket".to_string(), serde_json::json!(config.bucket.bucket));

    Ok(PatchDataset::create(
        &config.output,
        &config.channels.labels(),
        config.grid.size,
        &config.dataset,
        attributes,
    )?)
}

pub struct DatasetBuilder<S> {
    source: S,
    config: BuilderConfig,
    rng: StdRng,
}

impl<S: RasterSource> DatasetBuilder<S> {
    pub fn new(source: S, config: BuilderConfig) -> BuildResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { source, config, rng })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Append `n_batches` batches to `dataset`.
    #[instrument(skip(self, dataset), fields(path = %dataset.path().display(), batches = self.config.n_batches))]
    pub async fn run(&mut self, dataset: &mut PatchDataset) -> BuildResult<BuildSummary> {
        let mut summary = BuildSummary {
            samples: dataset.len(),
            ..Default::default()
        };

        for batch in 0..self.config.n_batches {
            let (samples, abandoned) = self.build_batch(batch, dataset).await?;
            summary.batches += 1;
            summary.samples = samples;
            summary.abandoned_attempts += abandoned;

            info!(batch, samples, abandoned, "Batch appended");
        }

        Ok(summary)
    }

    /// One batch: attempts until one completes or the retry cap is hit.
    /// Returns the new dataset length and the number of abandoned attempts.
    async fn build_batch(&mut self, batch: usize, dataset: &mut PatchDataset) -> BuildResult<(u64, u32)> {
        let max_attempts = self.config.retry.max_attempts;

        for attempt in 1..=max_attempts {
            let time = self.sample_time();
            debug!(batch, attempt, time = %time, "Starting attempt");

            let reason = match self.attempt(time).await {
                Ok(Attempt::Complete(batches)) => {
                    let samples = dataset.append(&batches)?;
                    return Ok((samples, attempt - 1));
                }
                Ok(Attempt::Abandoned(reason)) => reason,
                Err(e) if e.is_recoverable() => e.to_string(),
                Err(e) => return Err(e),
            };

            warn!(batch, attempt, time = %time, reason = %reason, "Abandoned attempt");
        }

        Err(BuildError::RetriesExhausted {
            batch,
            attempts: max_attempts,
        })
    }

    async fn attempt(&mut self, time: DateTime<Utc>) -> BuildResult<Attempt> {
        let rasters = match self.fetch_all(time).await? {
            Fetched::All(rasters) => rasters,
            Fetched::Missing(label) => return Ok(Attempt::Abandoned(format!("{} not found", label))),
        };

        let mut extracted = Vec::with_capacity(rasters.len());
        for (channel, raster) in self.config.channels.channels.iter().zip(&rasters) {
            let patches = self
                .config
                .grid
                .extract(&raster.array, channel.scale, channel.offset)?;
            extracted.push((channel.label.clone(), patches));
        }

        let n = extracted.first().map_or(0, |(_, batch)| batch.len());
        if let Some((label, batch)) = extracted.iter().find(|(_, batch)| batch.len() != n) {
            return Err(GridProcessorError::shape_mismatch(format!(
                "{} produced {} patches, expected {}",
                label,
                batch.len(),
                n
            ))
            .into());
        }
        if n == 0 {
            return Err(GridProcessorError::shape_mismatch("no patches extracted").into());
        }

        let indices = self.sample_indices(n);
        let selected = extracted
            .iter()
            .map(|(label, batch)| -> BuildResult<_> { Ok((label.clone(), batch.select(&indices)?)) })
            .collect::<BuildResult<Vec<_>>>()?;

        Ok(Attempt::Complete(selected))
    }

    /// Fetch every channel at `time`, in table order, with bounded
    /// concurrency. Stops at the first channel with nothing to fetch;
    /// fetches still in flight are dropped.
    async fn fetch_all(&self, time: DateTime<Utc>) -> BuildResult<Fetched> {
        let source = &self.source;
        let channels = &self.config.channels.channels;
        let started = std::time::Instant::now();

        let mut fetches = stream::iter(channels.iter())
            .map(|channel| async move {
                let raster = source.get(&channel.product, time, channel.channel).await?;
                Ok::<_, BuildError>((channel, raster))
            })
            .buffered(self.config.max_concurrent_fetches);

        let mut rasters = Vec::with_capacity(channels.len());
        while let Some(fetched) = fetches.next().await {
            match fetched? {
                (_, Some(raster)) => rasters.push(raster),
                (channel, None) => return Ok(Fetched::Missing(channel.label.clone())),
            }
        }

        debug!(
            channels = rasters.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched channels"
        );
        Ok(Fetched::All(rasters))
    }

    /// Uniform instant in the window at one-second resolution.
    fn sample_time(&mut self) -> DateTime<Utc> {
        let secs = self.rng.gen_range(0..self.config.window.duration_secs());
        self.config.window.at_offset(secs)
    }

    /// `n_subsample` indices in `[0, n)`, drawn with replacement.
    fn sample_indices(&mut self, n: usize) -> Vec<usize> {
        (0..self.config.n_subsample)
            .map(|_| self.rng.gen_range(0..n))
            .collect()
    }
}

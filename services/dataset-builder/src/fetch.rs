//! Fetch one decoded raster per (product, time, channel).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goes_common::{select_nearest, ProductCatalogEntry};
use netcdf_parser::{load_raster_from_bytes, RasterRecord};
use storage::{BucketConfig, GoesBucket, ListQuery, StorageError};
use tracing::{debug, info, instrument};

use crate::error::{BuildError, BuildResult};

/// Anything that can produce a decoded raster for a channel at an instant.
///
/// `Ok(None)` means nothing was found for that hour; the caller may try
/// another instant.
#[async_trait]
pub trait RasterSource: Send + Sync {
    async fn get(
        &self,
        product: &str,
        time: DateTime<Utc>,
        channel: Option<u8>,
    ) -> BuildResult<Option<RasterRecord>>;
}

/// [`RasterSource`] backed by the GOES bucket.
///
/// Lists the hour partition containing `time`, keeps the entries of the
/// requested band and decodes the one whose scan ended closest to `time`.
pub struct GoesFetcher {
    bucket: GoesBucket,
    timeout: Duration,
}

impl GoesFetcher {
    pub fn new(bucket: GoesBucket, timeout: Duration) -> Self {
        Self { bucket, timeout }
    }

    pub fn from_config(config: &BucketConfig, timeout: Duration) -> BuildResult<Self> {
        Ok(Self::new(GoesBucket::new(config)?, timeout))
    }

    pub fn bucket(&self) -> &GoesBucket {
        &self.bucket
    }

    /// The catalog entry nearest `time`, without downloading it.
    #[instrument(skip(self))]
    pub async fn find(
        &self,
        product: &str,
        time: DateTime<Utc>,
        channel: Option<u8>,
    ) -> BuildResult<Option<ProductCatalogEntry>> {
        let query = ListQuery::at(product, &time).channel(channel);
        let entries = self
            .with_timeout(format!("list {}", query.prefix()), self.bucket.list_entries(&query))
            .await?;

        let nearest = select_nearest(&entries, &time).cloned();
        match &nearest {
            Some(entry) => debug!(
                candidates = entries.len(),
                key = %entry.key(),
                "Selected nearest scan"
            ),
            None => debug!(prefix = %query.prefix(), "No matching objects"),
        }
        Ok(nearest)
    }

    async fn with_timeout<T, F>(&self, what: String, fut: F) -> BuildResult<T>
    where
        F: std::future::Future<Output = Result<T, StorageError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(BuildError::Timeout {
                what,
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl RasterSource for GoesFetcher {
    #[instrument(skip(self))]
    async fn get(
        &self,
        product: &str,
        time: DateTime<Utc>,
        channel: Option<u8>,
    ) -> BuildResult<Option<RasterRecord>> {
        let Some(entry) = self.find(product, time, channel).await? else {
            return Ok(None);
        };

        let key = entry.key();
        let bytes = match self.with_timeout(format!("get {}", key), self.bucket.get(&key)).await {
            Ok(bytes) => bytes,
            // Listed but gone by the time we asked for it.
            Err(BuildError::Storage(StorageError::NotFound(_))) => return Ok(None),
            Err(e) => return Err(e),
        };
        info!(key = %key, size = bytes.len(), "Fetched object");

        // libnetcdf blocks; keep it off the async workers.
        let raster = tokio::task::spawn_blocking(move || load_raster_from_bytes(&bytes)).await??;

        Ok(Some(raster.with_entry(entry)))
    }
}

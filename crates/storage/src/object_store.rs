//! Anonymous client for the public `noaa-goes16` bucket.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use goes_common::{parse_object_key, HourPartition, ProductCatalogEntry};
use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};

/// Connection settings for the GOES bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Alternate S3-compatible endpoint (mirrors, local MinIO)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub allow_http: bool,
}

fn default_bucket() -> String {
    "noaa-goes16".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint: None,
            allow_http: false,
        }
    }
}

/// A listing request: the product is mandatory, each finer partition level
/// narrows the prefix. Levels below the first missing one are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub product: String,
    pub year: Option<i32>,
    pub day_of_year: Option<u32>,
    pub hour: Option<u32>,
    /// Keep only entries whose parsed band equals this one.
    pub channel: Option<u8>,
    /// Keep only filenames starting with this string.
    pub file_prefix: Option<String>,
}

impl ListQuery {
    pub fn product(product: impl Into<String>) -> Self {
        Self {
            product: product.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// The hour partition containing `time`.
    pub fn at(product: impl Into<String>, time: &DateTime<Utc>) -> Self {
        let partition = HourPartition::from_datetime(time);
        Self::product(product)
            .year(partition.year)
            .day_of_year(partition.day_of_year)
            .hour(partition.hour)
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn day_of_year(mut self, day_of_year: u32) -> Self {
        self.day_of_year = Some(day_of_year);
        self
    }

    pub fn hour(mut self, hour: u32) -> Self {
        self.hour = Some(hour);
        self
    }

    pub fn channel(mut self, channel: Option<u8>) -> Self {
        self.channel = channel;
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
        self
    }

    /// Key prefix, e.g. `ABI-L2-CMIPF/2020/123/03/`.
    pub fn prefix(&self) -> String {
        let mut prefix = format!("{}/", self.product);
        let Some(year) = self.year else {
            return prefix;
        };
        prefix.push_str(&format!("{}/", year));
        let Some(day) = self.day_of_year else {
            return prefix;
        };
        prefix.push_str(&format!("{:03}/", day));
        if let Some(hour) = self.hour {
            prefix.push_str(&format!("{:02}/", hour));
        }
        prefix
    }

    fn matches_key(&self, key: &str) -> bool {
        match &self.file_prefix {
            Some(file_prefix) => key
                .rsplit('/')
                .next()
                .is_some_and(|name| name.starts_with(file_prefix.as_str())),
            None => true,
        }
    }
}

/// Read-only view of the GOES bucket.
pub struct GoesBucket {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl GoesBucket {
    /// Connect anonymously; requests are sent unsigned.
    pub fn new(config: &BucketConfig) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_skip_signature(true);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Client(e.to_string()))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// Wrap an existing store, e.g. `object_store::memory::InMemory` in tests.
    pub fn with_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object keys under the query prefix, sorted.
    #[instrument(skip(self), fields(bucket = %self.bucket, prefix = %query.prefix()))]
    pub async fn list(&self, query: &ListQuery) -> StorageResult<Vec<String>> {
        let prefix = query.prefix();
        let prefix_path = Path::from(prefix.as_str());
        let mut keys = Vec::new();

        let mut stream = self.store.list(Some(&prefix_path));
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|e| StorageError::request(prefix.as_str(), e))?
        {
            let key = meta.location.to_string();
            if query.matches_key(&key) {
                keys.push(key);
            }
        }

        keys.sort();
        debug!(count = keys.len(), "Listed objects");
        Ok(keys)
    }

    /// Parsed catalog entries under the query prefix, filtered by channel.
    ///
    /// A key that does not follow the GOES naming convention fails the whole
    /// listing with [`StorageError::Catalog`].
    pub async fn list_entries(&self, query: &ListQuery) -> StorageResult<Vec<ProductCatalogEntry>> {
        let keys = self.list(query).await?;

        let mut entries = Vec::with_capacity(keys.len());
        for key in &keys {
            let entry = parse_object_key(key)?;
            if entry.matches_channel(query.channel) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Read a whole object.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let location = Path::from(key);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| StorageError::request(key, e))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::request(key, e))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// Save an entry's object to `dest`. When `dest` is a directory the
    /// object's filename is appended. Returns the written path.
    #[instrument(skip(self, entry), fields(key = %entry.key()))]
    pub async fn download(&self, entry: &ProductCatalogEntry, dest: &FsPath) -> StorageResult<PathBuf> {
        let target = if dest.is_dir() {
            dest.join(&entry.filename)
        } else {
            dest.to_path_buf()
        };
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = self.get(&entry.key()).await?;
        tokio::fs::write(&target, &bytes).await?;

        debug!(path = %target.display(), size = bytes.len(), "Downloaded object");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_list_query_prefix() {
        let t = Utc.with_ymd_and_hms(2020, 1, 5, 7, 45, 0).unwrap();
        assert_eq!(
            ListQuery::at("ABI-L2-CMIPF", &t).prefix(),
            "ABI-L2-CMIPF/2020/005/07/"
        );
        assert_eq!(ListQuery::product("ABI-L2-CMIPF/").prefix(), "ABI-L2-CMIPF/");
        assert_eq!(
            ListQuery::product("ABI-L2-CMIPF").year(2020).prefix(),
            "ABI-L2-CMIPF/2020/"
        );
        // hour without a day does not narrow the prefix
        assert_eq!(
            ListQuery::product("ABI-L2-CMIPF").year(2020).hour(3).prefix(),
            "ABI-L2-CMIPF/2020/"
        );
    }

    #[test]
    fn test_file_prefix_filter() {
        let query = ListQuery::product("ABI-L2-CMIPF").file_prefix("OR_ABI-L2-CMIPF-M6C13");
        assert!(query.matches_key("ABI-L2-CMIPF/2020/005/07/OR_ABI-L2-CMIPF-M6C13_G16_s1_e2_c3.nc"));
        assert!(!query.matches_key("ABI-L2-CMIPF/2020/005/07/OR_ABI-L2-CMIPF-M6C01_G16_s1_e2_c3.nc"));
    }

    #[test]
    fn test_default_config_is_goes16() {
        let config = BucketConfig::default();
        assert_eq!(config.bucket, "noaa-goes16");
        assert_eq!(config.region, "us-east-1");
        assert!(GoesBucket::new(&config).is_ok());
    }
}

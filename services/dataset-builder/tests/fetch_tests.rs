//! Bucket-backed fetcher against an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use dataset_builder::{BuildError, GoesFetcher, RasterSource};
use object_store::{memory::InMemory, path::Path, ObjectStore};
use storage::{GoesBucket, StorageError};
use test_utils::hour_of_scans;

const PRODUCT: &str = "ABI-L2-CMIPF";

async fn fetcher(keys: &[String]) -> GoesFetcher {
    let store = InMemory::new();
    for key in keys {
        store
            .put(&Path::from(key.as_str()), bytes::Bytes::from(key.clone()).into())
            .await
            .unwrap();
    }
    GoesFetcher::new(
        GoesBucket::with_store(Arc::new(store), "noaa-goes16"),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_find_nearest_scan_of_band() {
    let hour = Utc.with_ymd_and_hms(2020, 3, 10, 14, 0, 0).unwrap();
    let mut keys = hour_of_scans(PRODUCT, Some(7), hour);
    keys.extend(hour_of_scans(PRODUCT, Some(13), hour));
    let fetcher = fetcher(&keys).await;

    let target = Utc.with_ymd_and_hms(2020, 3, 10, 14, 41, 0).unwrap();
    let entry = fetcher.find(PRODUCT, target, Some(13)).await.unwrap().unwrap();
    assert_eq!(entry.channel, Some(13));
    // the 14:30 scan ends at 14:39:30.8, closest to 14:41
    assert_eq!(entry.start_time, Utc.with_ymd_and_hms(2020, 3, 10, 14, 30, 0).unwrap());

    assert!(fetcher.find(PRODUCT, target, Some(2)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_hour_is_not_found() {
    let hour = Utc.with_ymd_and_hms(2020, 3, 10, 14, 0, 0).unwrap();
    let fetcher = fetcher(&hour_of_scans(PRODUCT, Some(13), hour)).await;

    let next_day = Utc.with_ymd_and_hms(2020, 3, 11, 14, 5, 0).unwrap();
    assert!(fetcher.get(PRODUCT, next_day, Some(13)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_undecodable_object_is_an_error() {
    let hour = Utc.with_ymd_and_hms(2020, 3, 10, 14, 0, 0).unwrap();
    // object bodies are the key text, not NetCDF
    let fetcher = fetcher(&hour_of_scans(PRODUCT, Some(13), hour)).await;

    let err = fetcher.get(PRODUCT, hour, Some(13)).await.unwrap_err();
    assert!(matches!(err, BuildError::Decode(_)));
}

#[tokio::test]
async fn test_malformed_key_is_an_error() {
    let hour = Utc.with_ymd_and_hms(2020, 3, 10, 14, 0, 0).unwrap();
    let mut keys = hour_of_scans(PRODUCT, Some(13), hour);
    keys.push(format!("{}/2020/070/14/README.txt", PRODUCT));
    let fetcher = fetcher(&keys).await;

    let err = fetcher.get(PRODUCT, hour, Some(13)).await.unwrap_err();
    assert!(matches!(err, BuildError::Storage(StorageError::Catalog(_))));
}

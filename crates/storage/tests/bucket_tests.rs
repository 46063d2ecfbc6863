//! Listing, parsing and downloading against an in-memory bucket.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use goes_common::select_nearest;
use object_store::{memory::InMemory, path::Path, ObjectStore};
use storage::{GoesBucket, ListQuery, StorageError};
use test_utils::{goes_key, hour_of_scans, temp_test_dir_with_prefix, EXAMPLE_KEY};

const PRODUCT: &str = "ABI-L2-CMIPF";

async fn seeded_bucket(keys: &[String]) -> GoesBucket {
    let store = InMemory::new();
    for key in keys {
        store
            .put(&Path::from(key.as_str()), bytes::Bytes::from(key.clone()).into())
            .await
            .unwrap();
    }
    GoesBucket::with_store(Arc::new(store), "noaa-goes16")
}

#[tokio::test]
async fn test_list_entries_filters_by_channel() {
    let hour = Utc.with_ymd_and_hms(2020, 3, 10, 14, 0, 0).unwrap();
    let mut keys = hour_of_scans(PRODUCT, Some(1), hour);
    keys.extend(hour_of_scans(PRODUCT, Some(13), hour));
    // neighbouring hour, must not be listed
    keys.extend(hour_of_scans(PRODUCT, Some(1), hour + Duration::hours(1)));
    let bucket = seeded_bucket(&keys).await;

    let query = ListQuery::at(PRODUCT, &hour).channel(Some(13));
    let entries = bucket.list_entries(&query).await.unwrap();
    assert_eq!(entries.len(), 6);
    assert!(entries.iter().all(|e| e.channel == Some(13) && e.hour == "14"));

    let all = bucket.list(&ListQuery::at(PRODUCT, &hour)).await.unwrap();
    assert_eq!(all.len(), 12);

    let day = bucket
        .list(&ListQuery::product(PRODUCT).year(2020).day_of_year(70))
        .await
        .unwrap();
    assert_eq!(day.len(), 18);
}

#[tokio::test]
async fn test_empty_partition_lists_nothing() {
    let hour = Utc.with_ymd_and_hms(2020, 3, 10, 14, 0, 0).unwrap();
    let bucket = seeded_bucket(&hour_of_scans(PRODUCT, Some(1), hour)).await;

    let other = ListQuery::at(PRODUCT, &(hour + Duration::days(1)));
    assert!(bucket.list_entries(&other).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_nearest_entry_and_get() {
    let hour = Utc.with_ymd_and_hms(2020, 3, 10, 14, 0, 0).unwrap();
    let bucket = seeded_bucket(&hour_of_scans(PRODUCT, Some(7), hour)).await;

    let target = hour + Duration::minutes(41);
    let entries = bucket
        .list_entries(&ListQuery::at(PRODUCT, &target).channel(Some(7)))
        .await
        .unwrap();
    let nearest = select_nearest(&entries, &target).unwrap();
    // the 14:30 scan ends at 14:39:30.8
    assert_eq!(nearest.start_time, hour + Duration::minutes(30));

    let body = bucket.get(&nearest.key()).await.unwrap();
    assert_eq!(body.as_ref(), nearest.key().as_bytes());
}

#[tokio::test]
async fn test_download_into_directory() {
    let start = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 21).unwrap();
    let key = goes_key(PRODUCT, Some(2), start);
    let bucket = seeded_bucket(&[key.clone()]).await;
    let entry = goes_common::parse_object_key(&key).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = bucket.download(&entry, dir.path()).await.unwrap();
    assert_eq!(written, dir.path().join(&entry.filename));
    assert_eq!(std::fs::read(&written).unwrap(), key.as_bytes());

    let explicit = dir.path().join("nested/copy.nc");
    let written = bucket.download(&entry, &explicit).await.unwrap();
    assert_eq!(written, explicit);
    assert!(explicit.exists());
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let bucket = seeded_bucket(&[]).await;
    let err = bucket.get("ABI-L2-CMIPF/2020/001/00/nothing.nc").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)), "{:?}", err);
}

#[tokio::test]
async fn test_malformed_key_fails_listing() {
    let keys = vec!["ABI-L2-CMIPF/2020/001/00/README.txt".to_string()];
    let bucket = seeded_bucket(&keys).await;
    let query = ListQuery::product(PRODUCT).year(2020).day_of_year(1).hour(0);

    let err = bucket.list_entries(&query).await.unwrap_err();
    assert!(matches!(err, StorageError::Catalog(_)), "{:?}", err);
}

#[tokio::test]
async fn test_conus_example_key() {
    let bucket = seeded_bucket(&[EXAMPLE_KEY.to_string()]).await;

    let query = ListQuery::product("ABI-L2-CMIPC")
        .year(2020)
        .day_of_year(123)
        .hour(3)
        .channel(Some(1));
    let entries = bucket.list_entries(&query).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key(), EXAMPLE_KEY);
    assert_eq!(entries[0].scan_mode.as_deref(), Some("M6"));

    let dir = temp_test_dir_with_prefix("goes_download_");
    let written = bucket.download(&entries[0], dir.path()).await.unwrap();
    assert_eq!(written.file_name().unwrap(), entries[0].filename.as_str());
}

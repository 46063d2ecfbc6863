//! GOES object key fixtures.

use chrono::{DateTime, Duration, Utc};
use goes_common::{format_goes_timestamp, HourPartition};

/// A real CONUS key from the bucket.
pub const EXAMPLE_KEY: &str = "ABI-L2-CMIPC/2020/123/03/OR_ABI-L2-CMIPC-M6C01_G16_s20201230301116_e20201230303489_c20201230303587.nc";

/// Full-disk mode 6 scan length.
pub fn full_disk_scan() -> Duration {
    Duration::milliseconds(9 * 60_000 + 30_800)
}

/// Object key for a mode 6 scan of `band` starting at `start`.
/// Pass `None` for products without a band segment.
pub fn goes_key(product: &str, band: Option<u8>, start: DateTime<Utc>) -> String {
    let end = start + full_disk_scan();
    let created = end + Duration::milliseconds(4_700);
    let band = band.map(|b| format!("C{:02}", b)).unwrap_or_default();
    format!(
        "{}OR_{}-M6{}_G16_s{}_e{}_c{}.nc",
        HourPartition::from_datetime(&start).prefix(product),
        product,
        band,
        format_goes_timestamp(&start),
        format_goes_timestamp(&end),
        format_goes_timestamp(&created),
    )
}

/// The six full-disk scans (every ten minutes) starting at `hour_start`.
pub fn hour_of_scans(product: &str, band: Option<u8>, hour_start: DateTime<Utc>) -> Vec<String> {
    (0..6)
        .map(|i| goes_key(product, band, hour_start + Duration::minutes(10 * i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use goes_common::parse_object_key;

    #[test]
    fn test_goes_key_parses() {
        let start = Utc.with_ymd_and_hms(2020, 2, 1, 6, 0, 21).unwrap() + Duration::milliseconds(600);
        let key = goes_key("ABI-L2-CMIPF", Some(9), start);
        assert!(key.starts_with("ABI-L2-CMIPF/2020/032/06/OR_ABI-L2-CMIPF-M6C09_G16_s2020032060021"));

        let entry = parse_object_key(&key).unwrap();
        assert_eq!(entry.channel, Some(9));
        assert_eq!(entry.start_time, start);
        assert_eq!(entry.end_time, start + full_disk_scan());
    }

    #[test]
    fn test_example_key_parses() {
        assert!(parse_object_key(EXAMPLE_KEY).is_ok());
    }

    #[test]
    fn test_hour_of_scans() {
        let hour = Utc.with_ymd_and_hms(2020, 2, 1, 6, 0, 0).unwrap();
        let keys = hour_of_scans("ABI-L2-ACMF", None, hour);
        assert_eq!(keys.len(), 6);
        assert!(keys.iter().all(|k| k.starts_with("ABI-L2-ACMF/2020/032/06/")));
    }
}

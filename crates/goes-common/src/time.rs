//! Time handling for GOES object keys and sampling windows.
//!
//! GOES filenames carry timestamps as `YYYYDDDHHMMSSt`: year, zero-padded
//! day of year, hour, minute, second and tenths of a second. Remote keys are
//! partitioned by `<year>/<day-of-year:03>/<hour:02>`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Digits before the fractional seconds: `YYYYDDDHHMMSS`.
const GOES_TIMESTAMP_WHOLE_LEN: usize = 13;

/// Maximum fractional digits (microsecond resolution).
const GOES_TIMESTAMP_MAX_FRACTION: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Timestamp out of range: {0}")]
    OutOfRange(String),
}

/// Parse an ISO 8601 timestamp, assuming UTC when no offset is given.
///
/// Accepts RFC 3339 (`2020-05-02T03:01:11Z`), a naive datetime
/// (`2020-05-02T03:01:11`) or a bare date (`2020-05-02`).
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Parse a GOES filename timestamp (`YYYYDDDHHMMSSt`).
///
/// Digits after the seconds are a decimal fraction of a second; GOES names
/// carry exactly one (tenths), but up to six are accepted.
pub fn parse_goes_timestamp(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let fraction_len = s.len().saturating_sub(GOES_TIMESTAMP_WHOLE_LEN);
    if !(1..=GOES_TIMESTAMP_MAX_FRACTION).contains(&fraction_len)
        || !s.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(TimeParseError::InvalidFormat(s.to_string()));
    }

    // Every byte is an ASCII digit, so slicing is safe and each parse succeeds.
    let field = |range: std::ops::Range<usize>| -> u32 { s[range].parse().unwrap_or_default() };

    let year = field(0..4) as i32;
    let day_of_year = field(4..7);
    let hour = field(7..9);
    let minute = field(9..11);
    let second = field(11..13);
    let fraction = field(GOES_TIMESTAMP_WHOLE_LEN..s.len());
    let micros = fraction * 10u32.pow((GOES_TIMESTAMP_MAX_FRACTION - fraction_len) as u32);

    let date = NaiveDate::from_yo_opt(year, day_of_year)
        .ok_or_else(|| TimeParseError::OutOfRange(s.to_string()))?;
    let time = NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
        .ok_or_else(|| TimeParseError::OutOfRange(s.to_string()))?;

    Ok(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
}

/// Number of fractional-second digits in a GOES group, or `None` when the
/// group is not `YYYYDDDHHMMSS` followed by 1 to 6 digits.
pub fn goes_timestamp_fraction_digits(s: &str) -> Option<u8> {
    let fraction_len = s.len().checked_sub(GOES_TIMESTAMP_WHOLE_LEN)?;
    (1..=GOES_TIMESTAMP_MAX_FRACTION)
        .contains(&fraction_len)
        .then_some(fraction_len as u8)
}

/// Format a timestamp as a GOES group, truncated to tenths of a second.
pub fn format_goes_timestamp(dt: &DateTime<Utc>) -> String {
    format_goes_timestamp_with(dt, 1)
}

/// Format a timestamp as a GOES group with `fraction_digits` digits after
/// the seconds, truncating. The width is clamped to 1..=6.
pub fn format_goes_timestamp_with(dt: &DateTime<Utc>, fraction_digits: u8) -> String {
    let width = (fraction_digits as usize).clamp(1, GOES_TIMESTAMP_MAX_FRACTION);
    let fraction = dt.timestamp_subsec_micros().min(999_999)
        / 10u32.pow((GOES_TIMESTAMP_MAX_FRACTION - width) as u32);
    format!("{}{:0width$}", dt.format("%Y%j%H%M%S"), fraction, width = width)
}

/// The `<year>/<doy>/<hour>` partition of the remote key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HourPartition {
    pub year: i32,
    pub day_of_year: u32,
    pub hour: u32,
}

impl HourPartition {
    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        Self {
            year: dt.year(),
            day_of_year: dt.ordinal(),
            hour: dt.hour(),
        }
    }

    /// Key prefix for this partition, e.g. `ABI-L2-CMIPF/2020/123/03/`.
    pub fn prefix(&self, product: &str) -> String {
        format!(
            "{}/{}/{:03}/{:02}/",
            product.trim_end_matches('/'),
            self.year,
            self.day_of_year,
            self.hour
        )
    }
}

/// A half-open `[start, end)` window of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole seconds between start and end (zero for an empty window).
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }

    /// The instant `secs` seconds after the start.
    pub fn at_offset(&self, secs: i64) -> DateTime<Utc> {
        self.start + Duration::seconds(secs)
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt < &self.end
    }

    pub fn is_empty(&self) -> bool {
        self.duration_secs() == 0
    }
}

impl Default for TimeRange {
    /// Window in which every ABI L2 full-disk product is available.
    fn default() -> Self {
        Self {
            start: Utc.with_ymd_and_hms(2019, 12, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2020, 11, 1, 0, 0, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso8601() {
        let dt = parse_iso8601("2020-05-02T03:01:11Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2020, 5, 2, 3, 1, 11).unwrap());

        let naive = parse_iso8601("2020-05-02T03:01:11").unwrap();
        assert_eq!(naive, dt);

        let date = parse_iso8601("2020-05-02").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2020, 5, 2, 0, 0, 0).unwrap());

        assert!(parse_iso8601("yesterday").is_err());
    }

    #[test]
    fn test_parse_goes_timestamp() {
        assert!(parse_goes_timestamp("2020123030111").is_err());

        let dt = parse_goes_timestamp("20201230301116").unwrap();
        assert_eq!(dt.year(), 2020);
        assert_eq!(dt.ordinal(), 123);
        assert_eq!(dt.month(), 5);
        assert_eq!(dt.day(), 2);
        assert_eq!(dt.hour(), 3);
        assert_eq!(dt.minute(), 1);
        assert_eq!(dt.second(), 11);
        assert_eq!(dt.timestamp_subsec_millis(), 600);
    }

    #[test]
    fn test_goes_timestamp_rejects_bad_day() {
        assert!(matches!(
            parse_goes_timestamp("20193660301116"),
            Err(TimeParseError::OutOfRange(_))
        ));
        assert!(parse_goes_timestamp("202012303011a6").is_err());
    }

    #[test]
    fn test_parse_goes_timestamp_microseconds() {
        let dt = parse_goes_timestamp("2020123030111123456").unwrap();
        assert_eq!(dt.timestamp_subsec_micros(), 123_456);
        assert!(parse_goes_timestamp("20201230301111234567").is_err());
    }

    #[test]
    fn test_format_goes_timestamp() {
        let dt = Utc.with_ymd_and_hms(2020, 1, 5, 7, 8, 9).unwrap()
            + Duration::milliseconds(350);
        assert_eq!(format_goes_timestamp(&dt), "20200050708093");
        assert_eq!(format_goes_timestamp_with(&dt, 3), "20200050708093350");
        assert_eq!(format_goes_timestamp_with(&dt, 6), "20200050708093350000");
    }

    #[test]
    fn test_goes_timestamp_round_trip_keeps_width() {
        for group in [
            "20201230301116",
            "202012303011160",
            "202012303011123",
            "20201230301110",
            "2020123030111050",
            "2020123030111123456",
        ] {
            let digits = goes_timestamp_fraction_digits(group).unwrap();
            let dt = parse_goes_timestamp(group).unwrap();
            assert_eq!(format_goes_timestamp_with(&dt, digits), group);
        }
        assert_eq!(goes_timestamp_fraction_digits("2020123030111"), None);
        assert_eq!(goes_timestamp_fraction_digits("20201230301111234567"), None);
    }

    #[test]
    fn test_hour_partition_prefix() {
        let dt = Utc.with_ymd_and_hms(2020, 5, 2, 3, 30, 0).unwrap();
        let partition = HourPartition::from_datetime(&dt);
        assert_eq!(partition.day_of_year, 123);
        assert_eq!(partition.prefix("ABI-L2-CMIPF"), "ABI-L2-CMIPF/2020/123/03/");
        assert_eq!(partition.prefix("ABI-L2-CMIPF/"), "ABI-L2-CMIPF/2020/123/03/");
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::default();
        assert_eq!(range.duration_secs(), 336 * 86_400);
        assert!(range.contains(&range.start));
        assert!(!range.contains(&range.end));
        assert_eq!(range.at_offset(60), range.start + Duration::minutes(1));

        let empty = TimeRange::new(range.end, range.start);
        assert!(empty.is_empty());
    }
}

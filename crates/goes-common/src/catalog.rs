//! Catalog entries parsed from GOES object keys.
//!
//! Remote keys follow `<product>/<year>/<doy:03>/<hour:02>/<filename>` and
//! filenames follow
//! `OR_<product>-M<mode>C<band>_G<sat>_s<start>_e<end>_c<created>.nc`, e.g.
//!
//! ```text
//! ABI-L2-CMIPC/2020/123/03/OR_ABI-L2-CMIPC-M6C01_G16_s20201230301116_e20201230303489_c20201230303587.nc
//! ```
//!
//! Only the three timestamp groups are mandatory. The scan mode, band and
//! satellite segments are recovered when present; products without a band
//! (cloud masks, derived motion winds) simply leave `channel` empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::time::{format_goes_timestamp_with, goes_timestamp_fraction_digits, parse_goes_timestamp};

/// One remote object's parsed identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCatalogEntry {
    /// Product name, e.g. `ABI-L2-CMIPF`
    pub product: String,
    /// Calendar year as it appears in the key
    pub year: String,
    /// Zero-padded day of year as it appears in the key
    pub day_of_year: String,
    /// Zero-padded hour as it appears in the key
    pub hour: String,
    pub filename: String,
    /// Observation start (`_s` group)
    pub start_time: DateTime<Utc>,
    /// Observation end (`_e` group)
    pub end_time: DateTime<Utc>,
    /// File creation (`_c` group)
    pub creation_time: DateTime<Utc>,
    /// ABI band number from the `C<nn>` segment
    pub channel: Option<u8>,
    /// Scan mode from the `M<n>` segment, e.g. `M6`
    pub scan_mode: Option<String>,
    /// Satellite from the `G<nn>` segment, e.g. `G16`
    pub satellite: Option<String>,
    /// Fractional-second digits of the `_s`, `_e` and `_c` groups
    #[serde(default = "default_fraction_digits")]
    pub fraction_digits: [u8; 3],
}

fn default_fraction_digits() -> [u8; 3] {
    [1; 3]
}

impl ProductCatalogEntry {
    /// Rebuild the full object key.
    pub fn key(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.product, self.year, self.day_of_year, self.hour, self.filename
        )
    }

    /// The start, end and creation timestamp groups, re-encoded with the
    /// widths they were parsed with.
    pub fn timestamp_strings(&self) -> [String; 3] {
        let [s, e, c] = self.fraction_digits;
        [
            format_goes_timestamp_with(&self.start_time, s),
            format_goes_timestamp_with(&self.end_time, e),
            format_goes_timestamp_with(&self.creation_time, c),
        ]
    }

    /// Structured band filter: `None` matches every entry.
    pub fn matches_channel(&self, channel: Option<u8>) -> bool {
        match channel {
            Some(band) => self.channel == Some(band),
            None => true,
        }
    }

    /// Absolute distance between `end_time` and `target`.
    pub fn end_time_distance(&self, target: &DateTime<Utc>) -> chrono::Duration {
        let delta = self.end_time - *target;
        if delta < chrono::Duration::zero() {
            -delta
        } else {
            delta
        }
    }
}

/// Parse an object key into a catalog entry.
///
/// Pure function; fails with [`CatalogError::Parse`] when the key layout or
/// the `_s`/`_e`/`_c` timestamp groups do not match the naming convention.
pub fn parse_object_key(key: &str) -> CatalogResult<ProductCatalogEntry> {
    let parts: Vec<&str> = key.split('/').collect();
    if parts.len() != 5 || parts.iter().any(|p| p.is_empty()) {
        return Err(CatalogError::parse(
            key,
            "expected <product>/<year>/<doy>/<hour>/<filename>",
        ));
    }

    let filename = parts[4];
    let [start, end, created] = split_timestamp_groups(filename)
        .ok_or_else(|| CatalogError::parse(key, "missing _s/_e/_c timestamp groups"))?;

    let parse_time = |group: &str| {
        parse_goes_timestamp(group).map_err(|source| CatalogError::Timestamp {
            key: key.to_string(),
            source,
        })
    };

    let (scan_mode, channel) = parse_mode_and_channel(filename);
    let width = |group: &str| goes_timestamp_fraction_digits(group).unwrap_or(1);

    Ok(ProductCatalogEntry {
        product: parts[0].to_string(),
        year: parts[1].to_string(),
        day_of_year: parts[2].to_string(),
        hour: parts[3].to_string(),
        filename: filename.to_string(),
        start_time: parse_time(start)?,
        end_time: parse_time(end)?,
        creation_time: parse_time(created)?,
        channel,
        scan_mode,
        satellite: parse_satellite(filename),
        fraction_digits: [width(start), width(end), width(created)],
    })
}

/// Pick the entry whose `end_time` is closest to `target`.
///
/// Ties resolve to the earliest entry in list order.
pub fn select_nearest<'a>(
    entries: &'a [ProductCatalogEntry],
    target: &DateTime<Utc>,
) -> Option<&'a ProductCatalogEntry> {
    let mut best: Option<&ProductCatalogEntry> = None;
    for entry in entries {
        match best {
            Some(current) if entry.end_time_distance(target) >= current.end_time_distance(target) => {}
            _ => best = Some(entry),
        }
    }
    best
}

/// Locate `..._s<digits>_e<digits>_c<digits>.<ext>` at the end of a filename.
fn split_timestamp_groups(filename: &str) -> Option<[&str; 3]> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }

    let (rest, created) = stem.rsplit_once("_c")?;
    let (rest, end) = rest.rsplit_once("_e")?;
    let (head, start) = rest.rsplit_once("_s")?;

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if head.is_empty() || !digits(start) || !digits(end) || !digits(created) {
        return None;
    }

    Some([start, end, created])
}

/// Extract `M<mode>` and `C<band>` from the product segment, e.g.
/// `ABI-L2-CMIPF-M6C01` gives `("M6", 1)` and `ABI-L2-ACMF-M6` gives `("M6", None)`.
fn parse_mode_and_channel(filename: &str) -> (Option<String>, Option<u8>) {
    let Some(segment) = filename.split('_').nth(1) else {
        return (None, None);
    };
    let Some((_, tail)) = segment.rsplit_once('-') else {
        return (None, None);
    };
    let Some(mode_and_band) = tail.strip_prefix('M') else {
        return (None, None);
    };

    let (mode_digits, band) = match mode_and_band.split_once('C') {
        Some((mode, band)) => (mode, Some(band)),
        None => (mode_and_band, None),
    };

    if mode_digits.is_empty() || !mode_digits.bytes().all(|b| b.is_ascii_digit()) {
        return (None, None);
    }

    let channel = band
        .filter(|b| b.len() == 2 && b.bytes().all(|c| c.is_ascii_digit()))
        .and_then(|b| b.parse().ok());

    (Some(format!("M{}", mode_digits)), channel)
}

/// Extract the `G<nn>` satellite segment.
fn parse_satellite(filename: &str) -> Option<String> {
    filename
        .split('_')
        .find(|part| {
            part.len() > 1
                && part.starts_with('G')
                && part[1..].bytes().all(|b| b.is_ascii_digit())
        })
        .map(str::to_string)
}

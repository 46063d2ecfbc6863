//! Common types and utilities shared across the GOES dataset crates.

pub mod catalog;
pub mod error;
pub mod products;
pub mod time;

pub use catalog::{parse_object_key, select_nearest, ProductCatalogEntry};
pub use error::{CatalogError, CatalogResult};
pub use products::{is_known_product, validate_product, GOES_PRODUCTS};
pub use time::{
    format_goes_timestamp, format_goes_timestamp_with, goes_timestamp_fraction_digits,
    parse_goes_timestamp, parse_iso8601, HourPartition, TimeParseError, TimeRange,
};

//! Storage access for the GOES dataset builder.
//!
//! Wraps `object_store` for read-only, unsigned access to the public
//! `noaa-goes16` bucket: partition listings, catalog-entry parsing of the
//! listed keys, whole-object reads and downloads to disk.

pub mod error;
pub mod object_store;

pub use self::object_store::{BucketConfig, GoesBucket, ListQuery};
pub use error::{StorageError, StorageResult};

//! Storage layer for timeshift
//!
//! A snapshot is a pristine SQLite backup plus a working copy that is
//! restored from it and rewritten in place.

pub mod snapshot;
pub mod sqlite;

pub use snapshot::{RestoreReport, SeedReport, SnapshotStore, file_sha256};
pub use sqlite::{Catalog, CatalogColumn, CatalogTable, Database};

pub mod app;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod shift;
pub mod storage;
pub mod test_utils;

pub use error::{Result, ShiftError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

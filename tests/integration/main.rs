//! Integration tests for the snapshot store and time-shift engine.
//!
//! Each test works on a travel snapshot created in its own temp directory.

mod fixture;
mod shift_tests;
mod store_tests;

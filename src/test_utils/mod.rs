//! Shared test utilities for timeshift.
//!
//! Used by unit tests, the integration and property suites, and the bench.

pub mod fixtures;

pub use fixtures::{BookingRow, FlightRow, TravelSnapshot, write_travel_db};

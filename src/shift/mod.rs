//! Time-shift engine.
//!
//! One offset, `now - max(reference column)`, is added to every value of
//! every planned temporal column so the snapshot's latest event lands on the
//! current instant while intervals between rows are kept.

pub mod clock;
pub mod engine;
pub mod offset;
pub mod plan;
pub mod timestamp;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{ShiftReport, TimeShiftEngine, update_dates};
pub use offset::{AnchorPolicy, ColumnShift, OffsetComputation, apply_offset, compute_offset};
pub use plan::{ColumnRef, ShiftPlan};
pub use timestamp::{Timestamp, Zone, format_utc};

//! Injectable source of "now".

use chrono::{DateTime, SubsecRound, Utc};

/// Supplies the current instant to the shift engine.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock, truncated to microseconds so shifted values stay
/// within the precision the snapshot stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc>,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

//! Time source for settle delays, suppression windows and teardown timers.
//!
//! The coordinator never reads the wall clock directly; tests drive it with
//! the manual clocks from the test-support crate.

use chrono::{DateTime, Utc};

/// Where the coordinator reads "now" from when it arms or fires a timer.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time, used by the simulator binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

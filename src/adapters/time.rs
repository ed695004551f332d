//! Monotonic clock adapter.
//!
//! Wraps `std::time::Instant`, which never goes backwards when the wall
//! clock is adjusted.

use core::time::Duration;
use std::time::Instant;

use crate::app::ports::Clock;

/// Time since the adapter was created.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

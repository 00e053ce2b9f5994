//! Monotonic clock adapter.

use std::time::Instant;

use crate::app::ports::Clock;

/// Milliseconds since this clock was created, backed by [`Instant`] so it
/// never goes backwards (wall-clock adjustments don't reach it).
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

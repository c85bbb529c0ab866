//! Host clock adapter.
//!
//! Monotonic milliseconds from `std::time::Instant`, truncated to `u32`
//! so the reading wraps like a microcontroller tick counter.

use std::time::{Duration, Instant};

use crate::ports::Clock;

pub struct StdClock {
    start: Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since construction.
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

//! Monotonic millisecond clock and sleep primitive.
//!
//! Every timing decision in the crate (inactivity, backoff, statistics, field
//! arrival times) goes through a [`Clock`]. It is backed by
//! `tokio::time::Instant`, so tests running on a paused runtime control it.

use std::time::Duration;
use tokio::time::Instant;

/// Millisecond time source relative to its own creation.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Clock {
            origin: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the clock was created.
    pub fn millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    /// Milliseconds elapsed since `since`, a value previously returned by
    /// [`Clock::millis`]. Never negative.
    pub fn elapsed_since(&self, since: u64) -> u64 {
        self.millis().saturating_sub(since)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Suspend the current task for `ms` milliseconds.
pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

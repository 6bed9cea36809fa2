//! # Logging Helpers
//!
//! Rate limiting and raw-buffer dumps for the acquisition loop. An unplugged
//! device makes the port manager retry every second forever, and a noisy line
//! can fail checksums on every frame; both would flood the log sink without a
//! throttle.
//!
//! ```rust
//! use vedirect_bridge::util::logging::LogThrottle;
//!
//! let mut throttle = LogThrottle::new(1000, 5); // 5 messages per second
//! if throttle.allow() {
//!     log::warn!("checksum mismatch");
//! }
//! ```

use crate::util::hex::{format_hex_compact, pretty_hex};
use tokio::time::Instant;

/// Throttling structure for rate-limiting log messages
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Messages refused since the last one that got through
    suppressed: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let elapsed_ms = self.t0.elapsed().as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = Instant::now();
            self.count = 0;
        }

        self.count += 1;
        if self.count <= self.cap {
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Number of messages dropped since the last call, then resets it.
    ///
    /// Call after a successful `allow()` to tell the reader how much was skipped.
    pub fn take_suppressed(&mut self) -> u32 {
        std::mem::take(&mut self.suppressed)
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
        self.suppressed = 0;
    }
}

/// Log a raw decoder buffer in hex at debug level.
///
/// Output is capped so a runaway line cannot produce a kilobyte-long record.
/// At trace level the whole buffer is dumped with offsets and its text column.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    if log::log_enabled!(target: "vedirect::frame", log::Level::Trace) {
        log::trace!(target: "vedirect::frame", "{prefix}:\n{}", pretty_hex(data, 16));
        return;
    }
    if !log::log_enabled!(target: "vedirect::frame", log::Level::Debug) {
        return;
    }

    let shown = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = format_hex_compact(shown);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!(target: "vedirect::frame", "{prefix}: {hex_str}{suffix}");
}

/// Log a warning with throttling, reporting how many were swallowed since.
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $($arg:tt)*) => {
        if $throttle.allow() {
            let suppressed = $throttle.take_suppressed();
            if suppressed > 0 {
                log::warn!("{} ({} similar messages suppressed)", format_args!($($arg)*), suppressed);
            } else {
                log::warn!($($arg)*);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_throttle_basic() {
        let mut throttle = LogThrottle::new(1000, 3);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(throttle.allow());

        assert!(!throttle.allow());
        assert!(!throttle.allow());
        assert_eq!(throttle.take_suppressed(), 2);
        assert_eq!(throttle.take_suppressed(), 0);
    }

    #[test]
    fn test_log_throttle_reset() {
        let mut throttle = LogThrottle::new(1000, 2);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(!throttle.allow());

        throttle.reset();
        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(!throttle.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_follows_runtime_clock() {
        let mut throttle = LogThrottle::new(60_000, 1);
        assert!(throttle.allow());
        assert!(!throttle.allow());

        tokio::time::advance(std::time::Duration::from_millis(59_000)).await;
        assert!(!throttle.allow());

        tokio::time::advance(std::time::Duration::from_millis(2_000)).await;
        assert!(throttle.allow());
        assert_eq!(throttle.take_suppressed(), 2);
    }

    #[test]
    fn test_log_frame_hex_does_not_panic() {
        log_frame_hex("short", b"V\t1");
        log_frame_hex("long", &[0x41; 200]);
    }
}

//! Request timestamps for signed trade API calls.
//!
//! Every signed request carries the wall-clock time in milliseconds, read
//! from [`SystemClock`] unless another provider is configured. The exchange
//! rejects requests whose time drifts from its own clock (ZB code 3007).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for providing request timestamps in milliseconds since UNIX epoch.
pub trait TimestampProvider: Send + Sync {
    /// The timestamp for the next request.
    fn now_millis(&self) -> u64;
}

/// Current wall-clock time in milliseconds since UNIX epoch.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Plain wall-clock provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimestampProvider for SystemClock {
    fn now_millis(&self) -> u64 {
        current_time_millis()
    }
}

/// A provider that generates strictly increasing millisecond timestamps.
///
/// Follows the wall clock, but when two requests land in the same
/// millisecond the later one is bumped forward by one. A burst of `n`
/// requests within one millisecond therefore runs up to `n - 1` ms ahead of
/// the wall clock until the clock catches up.
#[derive(Debug)]
pub struct IncreasingTimestamp {
    last: AtomicU64,
}

impl IncreasingTimestamp {
    /// Create a new increasing timestamp provider.
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }
}

impl Default for IncreasingTimestamp {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampProvider for IncreasingTimestamp {
    fn now_millis(&self) -> u64 {
        let now = current_time_millis();

        loop {
            let last = self.last.load(Ordering::SeqCst);
            let next = now.max(last + 1);

            if self
                .last
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return next;
            }
        }
    }
}

//! Request timestamps for KuCoin API authentication.
//!
//! Signed requests carry a millisecond timestamp in `KC-API-TIMESTAMP`, which is
//! also part of the signed payload. KuCoin rejects timestamps more than five
//! seconds away from its own clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for providing timestamps for signed requests.
pub trait TimestampProvider: Send + Sync {
    /// Milliseconds since the UNIX epoch to stamp the next request with.
    fn next_timestamp(&self) -> u64;
}

/// A timestamp provider based on the system clock.
///
/// Two requests signed within the same millisecond get distinct values, so a
/// timestamp never repeats for one provider.
pub struct IncreasingTimestamp {
    last: AtomicU64,
}

impl IncreasingTimestamp {
    /// Create a new timestamp provider.
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    fn current_time_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

impl Default for IncreasingTimestamp {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampProvider for IncreasingTimestamp {
    fn next_timestamp(&self) -> u64 {
        let now = Self::current_time_millis();

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

/// Timestamp provider returning a fixed value, for reproducible signatures.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimestamp(pub u64);

impl TimestampProvider for FixedTimestamp {
    fn next_timestamp(&self) -> u64 {
        self.0
    }
}

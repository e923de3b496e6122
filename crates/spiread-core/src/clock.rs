//! Injectable time sources.
//!
//! Timers read a monotonic clock for deltas and a wall clock for the
//! timestamps written into session summaries. Both come from the same
//! [`Clock`] so tests can drive a whole session without sleeping.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    /// Milliseconds on a monotonic scale. Only differences are meaningful.
    fn now_monotonic_ms(&self) -> u64;

    /// Milliseconds since the Unix epoch.
    fn now_epoch_ms(&self) -> i64;

    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_epoch_ms()).unwrap_or_default()
    }
}

/// Real time: `Instant` for deltas, `Utc::now()` for timestamps.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_monotonic_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn now_epoch_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock. Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    monotonic_ms: Arc<AtomicU64>,
    epoch_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the wall clock at `epoch_ms`.
    pub fn starting_at(epoch_ms: i64) -> Self {
        let clock = Self::default();
        clock.set_epoch_ms(epoch_ms);
        clock
    }

    /// Move both scales forward.
    pub fn advance(&self, ms: u64) {
        self.monotonic_ms.fetch_add(ms, Ordering::SeqCst);
        self.epoch_ms.fetch_add(ms as i64, Ordering::SeqCst);
    }

    pub fn set_epoch_ms(&self, epoch_ms: i64) {
        self.epoch_ms.store(epoch_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_monotonic_ms(&self) -> u64 {
        self.monotonic_ms.load(Ordering::SeqCst)
    }

    fn now_epoch_ms(&self) -> i64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(1_000);
        let other = clock.clone();
        clock.advance(250);
        assert_eq!(other.now_monotonic_ms(), 250);
        assert_eq!(other.now_epoch_ms(), 1_250);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_monotonic_ms();
        let b = clock.now_monotonic_ms();
        assert!(b >= a);
    }
}

//! Pause-aware elapsed-time primitive.

use std::sync::Arc;

use crate::clock::Clock;

/// Accumulates running time on a monotonic [`Clock`].
///
/// Every transition stamps a fresh reference point, so `lap_ms()` after a
/// resume never includes the time spent paused.
#[derive(Clone)]
pub struct Stopwatch {
    clock: Arc<dyn Clock>,
    accumulated_ms: u64,
    /// Monotonic timestamp of the last start/resume.
    running_since: Option<u64>,
    /// Reference point for the next `lap_ms()`.
    last_stamp: Option<u64>,
}

impl std::fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stopwatch")
            .field("accumulated_ms", &self.accumulated_ms)
            .field("running_since", &self.running_since)
            .field("last_stamp", &self.last_stamp)
            .finish()
    }
}

impl Stopwatch {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            accumulated_ms: 0,
            running_since: None,
            last_stamp: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let now = self.clock.now_monotonic_ms();
        self.running_since = Some(now);
        self.last_stamp = Some(now);
    }

    /// Alias of `start` for readability at call sites.
    pub fn resume(&mut self) {
        self.start();
    }

    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            let now = self.clock.now_monotonic_ms();
            self.accumulated_ms += now.saturating_sub(since);
        }
        self.last_stamp = None;
    }

    pub fn reset(&mut self) {
        self.accumulated_ms = 0;
        self.running_since = None;
        self.last_stamp = None;
    }

    /// Time since the previous lap (or start/resume). Zero when stopped.
    pub fn lap_ms(&mut self) -> u64 {
        match self.last_stamp {
            Some(last) => {
                let now = self.clock.now_monotonic_ms();
                self.last_stamp = Some(now);
                now.saturating_sub(last)
            }
            None => 0,
        }
    }

    /// Total running time, excluding pauses.
    pub fn elapsed_ms(&self) -> u64 {
        let live = self
            .running_since
            .map(|since| self.clock.now_monotonic_ms().saturating_sub(since))
            .unwrap_or(0);
        self.accumulated_ms + live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn pause_excludes_idle_time() {
        let clock = ManualClock::new();
        let mut watch = Stopwatch::new(Arc::new(clock.clone()));
        watch.start();
        clock.advance(300);
        watch.pause();
        clock.advance(10_000);
        watch.resume();
        clock.advance(200);
        assert_eq!(watch.elapsed_ms(), 500);
    }

    #[test]
    fn lap_restarts_after_resume() {
        let clock = ManualClock::new();
        let mut watch = Stopwatch::new(Arc::new(clock.clone()));
        watch.start();
        clock.advance(40);
        assert_eq!(watch.lap_ms(), 40);
        watch.pause();
        clock.advance(5_000);
        assert_eq!(watch.lap_ms(), 0);
        watch.resume();
        clock.advance(30);
        assert_eq!(watch.lap_ms(), 30);
    }
}

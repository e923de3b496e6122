//! Session countdown implementation.
//!
//! The session timer is a monotonic-clock state machine. It does not use
//! internal threads - the caller (or [`super::run_session`]) is responsible
//! for calling `tick()` every few tens of milliseconds.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> Ended
//!   ^                             |
//!   +----------- reset() ---------+
//! ```
//!
//! Each tick charges `min(now - last_stamp, max_tick_delta_ms)` against the
//! remaining time, so an event-loop stall or a throttled background tab can
//! never make the countdown jump by more than one clamped step.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SessionTimer::new(SessionTimerConfig::new(60.0), clock)
//!     .on_end(|| println!("time!"));
//! timer.start();
//! // In a loop:
//! timer.tick(); // Returns Some(Event::TimerEnded) exactly once
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::stopwatch::Stopwatch;
use crate::clock::Clock;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Terminal until `reset()`.
    Ended,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Ended => "ended",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseReason {
    /// `pause()` was called by the game shell.
    Manual,
    /// The host view became hidden while the session was running.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Countdown parameters supplied by the game shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTimerConfig {
    pub duration_sec: f64,
    #[serde(default)]
    pub autostart: bool,
    #[serde(default = "default_true")]
    pub sync_visibility: bool,
    /// Upper bound on the time charged by a single tick.
    #[serde(default = "default_max_tick_delta_ms")]
    pub max_tick_delta_ms: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_true() -> bool {
    true
}
fn default_max_tick_delta_ms() -> u64 {
    200
}
fn default_tick_interval_ms() -> u64 {
    50
}

impl SessionTimerConfig {
    pub fn new(duration_sec: f64) -> Self {
        Self {
            duration_sec,
            ..Self::default()
        }
    }

    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    pub fn with_sync_visibility(mut self, sync: bool) -> Self {
        self.sync_visibility = sync;
        self
    }

    /// Duration in milliseconds. Negative or NaN durations collapse to zero.
    pub fn duration_ms(&self) -> u64 {
        if self.duration_sec.is_finite() && self.duration_sec > 0.0 {
            (self.duration_sec * 1000.0).round() as u64
        } else {
            0
        }
    }
}

impl Default for SessionTimerConfig {
    fn default() -> Self {
        Self {
            duration_sec: 60.0,
            autostart: false,
            sync_visibility: true,
            max_tick_delta_ms: default_max_tick_delta_ms(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Outcome of a finished countdown, handed out once per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Foreground time charged against the countdown.
    pub elapsed_ms: u64,
    /// False when `stop()` ended the session with time remaining.
    pub completed: bool,
}

impl SessionResult {
    pub fn elapsed_sec(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }
}

type TickCallback = Box<dyn FnMut(u64) + Send>;
type EndCallback = Box<dyn FnMut() + Send>;

/// Fixed-duration countdown shared by every game shell.
pub struct SessionTimer {
    config: SessionTimerConfig,
    clock: Arc<dyn Clock>,
    stopwatch: Stopwatch,
    state: TimerState,
    time_left_ms: u64,
    pause_reason: Option<PauseReason>,
    visibility: Visibility,
    /// Latched once `on_end` has fired; cleared only by `reset()`.
    end_fired: bool,
    completed: bool,
    result_taken: bool,
    on_tick: Option<TickCallback>,
    on_end: Option<EndCallback>,
}

impl std::fmt::Debug for SessionTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTimer")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("time_left_ms", &self.time_left_ms)
            .field("pause_reason", &self.pause_reason)
            .field("visibility", &self.visibility)
            .field("end_fired", &self.end_fired)
            .finish_non_exhaustive()
    }
}

impl SessionTimer {
    /// Create a timer in `Idle`, or `Running` when `config.autostart` is set.
    pub fn new(config: SessionTimerConfig, clock: Arc<dyn Clock>) -> Self {
        let time_left_ms = config.duration_ms();
        let autostart = config.autostart;
        let mut timer = Self {
            stopwatch: Stopwatch::new(Arc::clone(&clock)),
            config,
            clock,
            state: TimerState::Idle,
            time_left_ms,
            pause_reason: None,
            visibility: Visibility::Visible,
            end_fired: false,
            completed: false,
            result_taken: false,
            on_tick: None,
            on_end: None,
        };
        if autostart {
            timer.start();
        }
        timer
    }

    /// Called after every tick with the remaining milliseconds.
    pub fn on_tick(mut self, callback: impl FnMut(u64) + Send + 'static) -> Self {
        self.on_tick = Some(Box::new(callback));
        self
    }

    /// Called exactly once when the countdown ends or is stopped.
    pub fn on_end(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_end = Some(Box::new(callback));
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn config(&self) -> &SessionTimerConfig {
        &self.config
    }

    pub fn time_left_ms(&self) -> u64 {
        self.time_left_ms
    }

    /// Remaining whole seconds, rounded up for display.
    pub fn time_left_secs(&self) -> u64 {
        self.time_left_ms.div_ceil(1000)
    }

    pub fn duration_ms(&self) -> u64 {
        self.config.duration_ms()
    }

    /// Foreground time charged so far.
    pub fn elapsed_foreground_ms(&self) -> u64 {
        self.duration_ms().saturating_sub(self.time_left_ms)
    }

    /// Unclamped running time, for diagnostics.
    pub fn raw_elapsed_ms(&self) -> u64 {
        self.stopwatch.elapsed_ms()
    }

    /// 0.0 .. 1.0 progress through the countdown.
    pub fn progress(&self) -> f64 {
        let total = self.duration_ms();
        if total == 0 {
            return if self.state == TimerState::Ended { 1.0 } else { 0.0 };
        }
        1.0 - (self.time_left_ms as f64 / total as f64)
    }

    pub fn pause_reason(&self) -> Option<PauseReason> {
        self.pause_reason
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_interval_ms.max(1))
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            time_left_ms: self.time_left_ms,
            duration_ms: self.duration_ms(),
            progress: self.progress(),
            at: self.clock.now_utc(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle => {
                if self.duration_ms() == 0 {
                    return self.finish(true);
                }
                self.state = TimerState::Running;
                self.stopwatch.start();
                tracing::debug!(duration_ms = self.duration_ms(), "session timer started");
                let started = Event::TimerStarted {
                    duration_ms: self.duration_ms(),
                    at: self.clock.now_utc(),
                };
                if self.config.sync_visibility && self.visibility == Visibility::Hidden {
                    self.suspend(PauseReason::Hidden);
                }
                Some(started)
            }
            TimerState::Paused => self.resume(),
            TimerState::Running | TimerState::Ended => None,
        }
    }

    /// Idempotent: pausing a paused timer is a no-op.
    pub fn pause(&mut self) -> Option<Event> {
        self.suspend(PauseReason::Manual)
    }

    /// Resume a paused timer. While the view is hidden the timer stays
    /// paused and is handed over to the next `Visible` change instead.
    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        if self.config.sync_visibility && self.visibility == Visibility::Hidden {
            self.pause_reason = Some(PauseReason::Hidden);
            tracing::debug!("resume deferred until the view is visible");
            return None;
        }
        self.state = TimerState::Running;
        self.pause_reason = None;
        self.stopwatch.resume();
        tracing::debug!(time_left_ms = self.time_left_ms, "session timer resumed");
        Some(Event::TimerResumed {
            time_left_ms: self.time_left_ms,
            at: self.clock.now_utc(),
        })
    }

    /// Force the session to end. Safe from any state; `on_end` fires at
    /// most once.
    pub fn stop(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Ended => return None,
            TimerState::Running => {
                if let Some(ended) = self.charge_elapsed() {
                    return Some(ended);
                }
            }
            TimerState::Idle | TimerState::Paused => {}
        }
        let completed = self.time_left_ms == 0;
        self.finish(completed)
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.state = TimerState::Idle;
        self.time_left_ms = self.duration_ms();
        self.stopwatch.reset();
        self.pause_reason = None;
        self.end_fired = false;
        self.completed = false;
        self.result_taken = false;
        Some(Event::TimerReset {
            at: self.clock.now_utc(),
        })
    }

    /// Call periodically. Returns `Some(Event::TimerEnded)` when time runs out.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.charge_elapsed()
    }

    /// Host visibility changed. Hidden time is never charged.
    pub fn set_visibility(&mut self, visibility: Visibility) -> Option<Event> {
        self.visibility = visibility;
        if !self.config.sync_visibility {
            return None;
        }
        match (visibility, self.state) {
            (Visibility::Hidden, TimerState::Running) => self.suspend(PauseReason::Hidden),
            (Visibility::Visible, TimerState::Paused)
                if self.pause_reason == Some(PauseReason::Hidden) =>
            {
                self.resume()
            }
            _ => None,
        }
    }

    /// The result of an ended run, handed out exactly once.
    pub fn take_result(&mut self) -> Option<SessionResult> {
        if self.state != TimerState::Ended || self.result_taken {
            return None;
        }
        self.result_taken = true;
        Some(SessionResult {
            elapsed_ms: self.elapsed_foreground_ms(),
            completed: self.completed,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn suspend(&mut self, reason: PauseReason) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        // Time since the last tick was still foreground time.
        if let Some(ended) = self.charge_elapsed() {
            return Some(ended);
        }
        self.stopwatch.pause();
        self.state = TimerState::Paused;
        self.pause_reason = Some(reason);
        tracing::debug!(?reason, time_left_ms = self.time_left_ms, "session timer paused");
        Some(Event::TimerPaused {
            time_left_ms: self.time_left_ms,
            reason,
            at: self.clock.now_utc(),
        })
    }

    fn charge_elapsed(&mut self) -> Option<Event> {
        let delta = self.stopwatch.lap_ms().min(self.config.max_tick_delta_ms);
        self.time_left_ms = self.time_left_ms.saturating_sub(delta);
        let time_left = self.time_left_ms;
        if let Some(callback) = self.on_tick.as_mut() {
            callback(time_left);
        }
        if self.time_left_ms == 0 {
            return self.finish(true);
        }
        None
    }

    fn finish(&mut self, completed: bool) -> Option<Event> {
        if self.end_fired {
            return None;
        }
        self.end_fired = true;
        self.completed = completed;
        self.state = TimerState::Ended;
        self.pause_reason = None;
        self.stopwatch.pause();
        tracing::debug!(
            completed,
            elapsed_ms = self.elapsed_foreground_ms(),
            "session timer ended"
        );
        if let Some(callback) = self.on_end.as_mut() {
            callback();
        }
        Some(Event::TimerEnded {
            elapsed_ms: self.elapsed_foreground_ms(),
            completed,
            at: self.clock.now_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn timer(duration_sec: f64) -> (SessionTimer, ManualClock) {
        let clock = ManualClock::starting_at(1_700_000_000_000);
        let timer = SessionTimer::new(SessionTimerConfig::new(duration_sec), Arc::new(clock.clone()));
        (timer, clock)
    }

    #[test]
    fn start_pause_resume() {
        let (mut timer, _clock) = timer(10.0);
        assert_eq!(timer.state(), TimerState::Idle);

        assert!(timer.start().is_some());
        assert_eq!(timer.state(), TimerState::Running);

        assert!(timer.pause().is_some());
        assert_eq!(timer.state(), TimerState::Paused);
        assert!(timer.pause().is_none());

        assert!(timer.resume().is_some());
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn tick_charges_clamped_delta() {
        let (mut timer, clock) = timer(10.0);
        timer.start();
        clock.advance(50);
        timer.tick();
        assert_eq!(timer.time_left_ms(), 9_950);

        // A five second stall only costs one clamped step.
        clock.advance(5_000);
        timer.tick();
        assert_eq!(timer.time_left_ms(), 9_750);
    }

    #[test]
    fn paused_time_is_not_charged() {
        let (mut timer, clock) = timer(10.0);
        timer.start();
        clock.advance(100);
        timer.pause();
        assert_eq!(timer.time_left_ms(), 9_900);
        clock.advance(60_000);
        timer.resume();
        clock.advance(50);
        timer.tick();
        assert_eq!(timer.time_left_ms(), 9_850);
    }

    #[test]
    fn end_fires_once_and_further_ticks_are_noops() {
        let ends = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ends);
        let (timer, clock) = timer(1.0);
        let mut timer = timer.on_end(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        timer.start();
        let mut ended = 0;
        for _ in 0..50 {
            clock.advance(100);
            if let Some(Event::TimerEnded { completed, .. }) = timer.tick() {
                assert!(completed);
                ended += 1;
            }
        }
        assert_eq!(ended, 1);
        assert_eq!(ends.load(Ordering::SeqCst), 1);
        assert_eq!(timer.state(), TimerState::Ended);
        assert!(timer.stop().is_none());
        assert_eq!(ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_from_any_state_fires_end_once() {
        let ends = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ends);
        let (timer, _clock) = timer(30.0);
        let mut timer = timer.on_end(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        match timer.stop() {
            Some(Event::TimerEnded { completed, .. }) => assert!(!completed),
            other => panic!("expected TimerEnded, got {other:?}"),
        }
        assert!(timer.stop().is_none());
        assert!(timer.start().is_none());
        assert_eq!(ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_returns_to_idle_with_full_duration() {
        let (mut timer, clock) = timer(5.0);
        timer.start();
        clock.advance(150);
        timer.tick();
        timer.stop();
        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.time_left_ms(), 5_000);
        assert!(timer.take_result().is_none());
        // A reset timer can end again.
        assert!(timer.stop().is_some());
    }

    #[test]
    fn hidden_view_auto_pauses_and_visible_resumes() {
        let (mut timer, clock) = timer(10.0);
        timer.start();
        clock.advance(100);
        let paused = timer.set_visibility(Visibility::Hidden);
        assert!(matches!(
            paused,
            Some(Event::TimerPaused {
                reason: PauseReason::Hidden,
                ..
            })
        ));
        clock.advance(120_000);
        timer.tick();
        assert_eq!(timer.time_left_ms(), 9_900);

        assert!(timer.set_visibility(Visibility::Visible).is_some());
        assert_eq!(timer.state(), TimerState::Running);
        clock.advance(50);
        timer.tick();
        assert_eq!(timer.time_left_ms(), 9_850);
    }

    #[test]
    fn visibility_does_not_resume_a_manual_pause() {
        let (mut timer, _clock) = timer(10.0);
        timer.start();
        timer.pause();
        timer.set_visibility(Visibility::Hidden);
        assert!(timer.set_visibility(Visibility::Visible).is_none());
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.pause_reason(), Some(PauseReason::Manual));
    }

    #[test]
    fn manual_resume_while_hidden_waits_for_visible() {
        let (mut timer, clock) = timer(10.0);
        timer.start();
        timer.set_visibility(Visibility::Hidden);
        assert!(timer.resume().is_none());
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.pause_reason(), Some(PauseReason::Hidden));

        for _ in 0..50 {
            clock.advance(100);
            timer.tick();
        }
        assert_eq!(timer.time_left_ms(), 10_000);

        assert!(timer.set_visibility(Visibility::Visible).is_some());
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn manual_pause_then_hidden_resume_waits_for_visible() {
        let (mut timer, _clock) = timer(10.0);
        timer.start();
        timer.pause();
        timer.set_visibility(Visibility::Hidden);
        assert!(timer.start().is_none());
        assert!(timer.set_visibility(Visibility::Visible).is_some());
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn stop_charges_time_since_last_tick() {
        let (mut timer, clock) = timer(10.0);
        timer.start();
        clock.advance(100);
        timer.tick();
        clock.advance(150);
        match timer.stop() {
            Some(Event::TimerEnded {
                elapsed_ms,
                completed,
                ..
            }) => {
                assert_eq!(elapsed_ms, 250);
                assert!(!completed);
            }
            other => panic!("expected TimerEnded, got {other:?}"),
        }
        assert_eq!(timer.take_result().unwrap().elapsed_ms, 250);
    }

    #[test]
    fn stop_that_drains_the_last_step_counts_as_completed() {
        let (mut timer, clock) = timer(0.1);
        timer.start();
        clock.advance(150);
        assert!(matches!(
            timer.stop(),
            Some(Event::TimerEnded { completed: true, .. })
        ));
    }

    #[test]
    fn visibility_ignored_without_sync() {
        let clock = ManualClock::new();
        let config = SessionTimerConfig::new(10.0).with_sync_visibility(false);
        let mut timer = SessionTimer::new(config, Arc::new(clock));
        timer.start();
        assert!(timer.set_visibility(Visibility::Hidden).is_none());
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn autostart_begins_running() {
        let clock = ManualClock::new();
        let timer = SessionTimer::new(
            SessionTimerConfig::new(3.0).with_autostart(true),
            Arc::new(clock),
        );
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn take_result_is_one_shot() {
        let (mut timer, clock) = timer(0.2);
        timer.start();
        clock.advance(200);
        timer.tick();
        let result = timer.take_result().unwrap();
        assert_eq!(result.elapsed_ms, 200);
        assert!(result.completed);
        assert!(timer.take_result().is_none());
    }

    #[test]
    fn time_left_secs_rounds_up() {
        let (mut timer, clock) = timer(2.0);
        timer.start();
        clock.advance(10);
        timer.tick();
        assert_eq!(timer.time_left_secs(), 2);
    }
}

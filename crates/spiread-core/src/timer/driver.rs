//! Async tick loop for a [`SessionTimer`].
//!
//! Game shells that own an event loop can call `tick()` themselves; shells
//! running on tokio hand the timer to [`run_session`] and steer it through a
//! command channel.

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::engine::{SessionTimer, TimerState, Visibility};
use crate::events::Event;

/// Commands a game shell may send while the loop owns the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Pause,
    Resume,
    Stop,
    Visibility(Visibility),
}

/// Tick `timer` on its configured interval until it ends.
///
/// Idle timers are started first. Returns the `TimerEnded` event, or `None`
/// if the timer had already ended before the call. When the command channel
/// closes the loop keeps ticking on its own.
pub async fn run_session(
    timer: &mut SessionTimer,
    mut commands: mpsc::Receiver<TimerCommand>,
) -> Option<Event> {
    if timer.state() == TimerState::Ended {
        return None;
    }
    if timer.state() == TimerState::Idle {
        if let Some(ended @ Event::TimerEnded { .. }) = timer.start() {
            return Some(ended);
        }
    }

    let mut ticker = interval(timer.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut commands_open = true;

    loop {
        let event = tokio::select! {
            _ = ticker.tick() => timer.tick(),
            command = commands.recv(), if commands_open => match command {
                Some(TimerCommand::Pause) => timer.pause(),
                Some(TimerCommand::Resume) => timer.resume(),
                Some(TimerCommand::Stop) => timer.stop(),
                Some(TimerCommand::Visibility(v)) => timer.set_visibility(v),
                None => {
                    commands_open = false;
                    None
                }
            },
        };

        if let Some(ended @ Event::TimerEnded { .. }) = event {
            return Some(ended);
        }
    }
}

/// Tick `timer` until it ends with no outside control.
///
/// Nothing can resume a paused timer here, so one that is `Paused` after
/// starting (a manual pause, or a hidden view) is returned with `None`;
/// resume it before handing it over.
pub async fn run_to_end(timer: &mut SessionTimer) -> Option<Event> {
    if timer.state() == TimerState::Idle {
        if let Some(ended @ Event::TimerEnded { .. }) = timer.start() {
            return Some(ended);
        }
    }
    if timer.state() == TimerState::Paused {
        tracing::debug!(reason = ?timer.pause_reason(), "paused timer not driven");
        return None;
    }
    let (_tx, rx) = mpsc::channel(1);
    run_session(timer, rx).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::SystemClock;
    use crate::timer::SessionTimerConfig;

    fn short_timer(duration_sec: f64) -> SessionTimer {
        let mut config = SessionTimerConfig::new(duration_sec);
        config.tick_interval_ms = 5;
        SessionTimer::new(config, Arc::new(SystemClock::new()))
    }

    #[tokio::test]
    async fn runs_until_countdown_completes() {
        let mut timer = short_timer(0.1);
        let (_tx, rx) = mpsc::channel(4);
        let ended = run_session(&mut timer, rx).await;
        assert!(matches!(ended, Some(Event::TimerEnded { completed: true, .. })));
        assert_eq!(timer.state(), TimerState::Ended);
        assert_eq!(timer.time_left_ms(), 0);
    }

    #[tokio::test]
    async fn stop_command_ends_early() {
        let mut timer = short_timer(30.0);
        let (tx, rx) = mpsc::channel(4);
        tx.send(TimerCommand::Stop).await.unwrap();
        let ended = run_session(&mut timer, rx).await;
        assert!(matches!(ended, Some(Event::TimerEnded { completed: false, .. })));
        assert!(timer.time_left_ms() > 0);
    }

    #[tokio::test]
    async fn closed_channel_keeps_ticking() {
        let mut timer = short_timer(0.05);
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        assert!(run_session(&mut timer, rx).await.is_some());
    }

    #[tokio::test]
    async fn run_to_end_completes_short_session() {
        let mut timer = short_timer(0.05);
        assert!(run_to_end(&mut timer).await.is_some());
        assert!(timer.take_result().is_some_and(|r| r.completed));
    }

    #[tokio::test]
    async fn run_to_end_leaves_paused_timer_alone() {
        let mut timer = short_timer(0.05);
        timer.start();
        timer.pause();
        assert!(run_to_end(&mut timer).await.is_none());
        assert_eq!(timer.state(), TimerState::Paused);

        let mut hidden = short_timer(0.05);
        hidden.set_visibility(Visibility::Hidden);
        assert!(run_to_end(&mut hidden).await.is_none());
        assert_eq!(hidden.state(), TimerState::Paused);
    }

    #[tokio::test]
    async fn ended_timer_returns_none() {
        let mut timer = short_timer(1.0);
        timer.stop();
        let (_tx, rx) = mpsc::channel(1);
        assert!(run_session(&mut timer, rx).await.is_none());
    }
}

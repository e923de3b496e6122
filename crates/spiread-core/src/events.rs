use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{PauseReason, TimerState};

/// Every state change of a session produces an Event.
/// Game shells poll for these; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        time_left_ms: u64,
        reason: PauseReason,
        at: DateTime<Utc>,
    },
    TimerResumed {
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero or was stopped.
    TimerEnded {
        elapsed_ms: u64,
        /// False when `stop()` cut the session short.
        completed: bool,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        time_left_ms: u64,
        duration_ms: u64,
        progress: f64,
        at: DateTime<Utc>,
    },
    BadgeUnlocked {
        badge_id: String,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = Event::TimerPaused {
            time_left_ms: 12_000,
            reason: PauseReason::Hidden,
            at: DateTime::from_timestamp_millis(0).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "timer_paused");
        assert_eq!(json["time_left_ms"], 12_000);
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}

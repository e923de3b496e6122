//! # Spiread Core Library
//!
//! Shared session machinery for the Spiread speed-reading and attention
//! mini-games. Every game shell (the desktop app, the CLI, tests) drives the
//! same countdown, difficulty calibration, progress records and badge
//! catalog through this crate.
//!
//! ## Architecture
//!
//! - **Session Timer**: a tick-driven countdown state machine. Wall-clock
//!   deltas are clamped per tick and time spent hidden is never charged.
//! - **Adaptive**: a 3-down/1-up staircase that converges on ~79% success,
//!   plus per-game tunables replayed from recent sessions.
//! - **Progress**: namespaced, versioned per-game records in a key-value
//!   backend (SQLite or in-memory), with a rolling window of sessions.
//! - **Achievements**: a static badge catalog evaluated against the
//!   aggregate of all games.
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: countdown state machine
//! - [`StaircaseState`] / [`Calibrator`]: difficulty adaptation
//! - [`ProgressStore`]: durable per-game progress
//! - [`TrainingEngine`]: the post-session pipeline tying them together
//! - [`Config`]: TOML configuration

pub mod achievements;
pub mod adaptive;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod progress;
pub mod storage;
pub mod timer;

pub use achievements::{achievement_progress, catalog, check_new_achievements, Badge};
pub use adaptive::{AdaptationConfig, Calibrator, StaircaseState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{SessionDraft, SessionOutcome, TrainingEngine};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use progress::{
    AggregateProgress, GameId, GameProgress, ProgressStore, SessionSummary, UserAchievements,
};
pub use storage::{Config, Database, MemoryBackend};
pub use timer::{SessionTimer, SessionTimerConfig, TimerState, Visibility};

mod driver;
mod engine;
mod stopwatch;

pub use driver::{run_session, run_to_end, TimerCommand};
pub use engine::{
    PauseReason, SessionResult, SessionTimer, SessionTimerConfig, TimerState, Visibility,
};
pub use stopwatch::Stopwatch;

//! Adaptive difficulty: the staircase procedure, the per-game calibration
//! registry, and a Monte Carlo convergence check.

mod calibration;
mod simulation;
mod staircase;

pub use calibration::{
    difficulty_hint, items_per_minute, moving_accuracy, AdaptationConfig, Calibrator,
    DifficultyHint, MemoryDigitsParams, ParImparParams, SchulteParams, TwinWordsParams,
    WordSearchParams, DEFAULT_TARGET_ACCURACY, MIN_CALIBRATION_SESSIONS,
};
pub use simulation::{simulate_staircase, success_probability, SimulationConfig, SimulationResult};
pub use staircase::{
    Direction, StaircaseState, CORRECT_TO_ADVANCE, MIN_STEP_SIZE, REVERSALS_BEFORE_SHRINK,
    STEP_SHRINK_FACTOR,
};

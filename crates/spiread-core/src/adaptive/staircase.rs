//! 3-down/1-up adaptive staircase.
//!
//! Three consecutive correct trials raise the level by one step; a single
//! incorrect trial lowers it immediately. With those odds the procedure
//! settles where roughly 79% of trials succeed (0.5^(1/3) ≈ 0.794).
//!
//! A reversal is counted each time the movement direction flips. From the
//! fourth reversal on, every further reversal shrinks the step by 20% down
//! to a floor of 0.5, which narrows the oscillation once the estimate has
//! stabilised.

use serde::{Deserialize, Serialize};

/// Consecutive correct trials required to move up.
pub const CORRECT_TO_ADVANCE: u32 = 3;
/// Reversals after which the step starts shrinking.
pub const REVERSALS_BEFORE_SHRINK: u32 = 4;
pub const STEP_SHRINK_FACTOR: f64 = 0.8;
pub const MIN_STEP_SIZE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaircaseState {
    pub current_level: f64,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub reversals: u32,
    pub last_direction: Option<Direction>,
    pub step_size: f64,
    pub min_level: f64,
    pub max_level: f64,
}

impl StaircaseState {
    /// Fresh staircase. Bounds are reordered if given backwards, the initial
    /// level is clamped into them (a non-finite one starts at the minimum),
    /// and a non-positive step becomes 1.
    pub fn new(initial_level: f64, min_level: f64, max_level: f64, step_size: f64) -> Self {
        let (min_level, max_level) = if min_level <= max_level {
            (min_level, max_level)
        } else {
            (max_level, min_level)
        };
        let step_size = if step_size.is_finite() && step_size > 0.0 {
            step_size
        } else {
            1.0
        };
        let current_level = if initial_level.is_finite() {
            initial_level.clamp(min_level, max_level)
        } else {
            min_level
        };
        Self {
            current_level,
            correct_count: 0,
            incorrect_count: 0,
            reversals: 0,
            last_direction: None,
            step_size,
            min_level,
            max_level,
        }
    }

    /// Next state after one trial.
    pub fn update(&self, is_correct: bool) -> StaircaseState {
        let mut next = self.clone();
        next.apply(is_correct);
        next
    }

    /// In-place form of [`update`](Self::update).
    pub fn apply(&mut self, is_correct: bool) {
        if is_correct {
            self.correct_count += 1;
            self.incorrect_count = 0;
            if self.correct_count >= CORRECT_TO_ADVANCE {
                self.turn(Direction::Up);
                self.current_level = (self.current_level + self.step_size).min(self.max_level);
                self.correct_count = 0;
            }
        } else {
            self.incorrect_count += 1;
            self.correct_count = 0;
            self.turn(Direction::Down);
            self.current_level = (self.current_level - self.step_size).max(self.min_level);
        }
    }

    /// Current threshold estimate.
    pub fn threshold_estimate(&self) -> f64 {
        self.current_level
    }

    fn turn(&mut self, direction: Direction) {
        let previous = self.last_direction.replace(direction);
        if previous.is_some_and(|p| p != direction) {
            self.reversals += 1;
            if self.reversals >= REVERSALS_BEFORE_SHRINK {
                // Never grows: a step already under the floor stays put.
                self.step_size = (self.step_size * STEP_SHRINK_FACTOR)
                    .max(MIN_STEP_SIZE)
                    .min(self.step_size);
            }
            tracing::trace!(
                reversals = self.reversals,
                step_size = self.step_size,
                "staircase reversal"
            );
        }
    }
}

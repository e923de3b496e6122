//! Per-game calibration of one tunable from stored session history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::staircase::StaircaseState;
use crate::progress::{GameId, SessionSummary, RECENT_WINDOW};

/// Sessions carrying an accuracy needed before calibration kicks in.
pub const MIN_CALIBRATION_SESSIONS: usize = 3;

/// Success rate a 3-down/1-up staircase converges to.
pub const DEFAULT_TARGET_ACCURACY: f64 = 0.79;

/// One named, bounded difficulty parameter of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationConfig {
    pub game_id: String,
    pub parameter_name: String,
    pub initial_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub step_size: f64,
    #[serde(default = "default_target_accuracy")]
    pub target_accuracy: f64,
}

fn default_target_accuracy() -> f64 {
    DEFAULT_TARGET_ACCURACY
}

impl AdaptationConfig {
    pub fn new(
        game_id: impl Into<String>,
        parameter_name: impl Into<String>,
        initial_value: f64,
        min_value: f64,
        max_value: f64,
        step_size: f64,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            parameter_name: parameter_name.into(),
            initial_value,
            min_value,
            max_value,
            step_size,
            target_accuracy: DEFAULT_TARGET_ACCURACY,
        }
    }

    /// Shipped tunable for `game`, if it adapts at all.
    pub fn builtin(game: GameId) -> Option<Self> {
        let config = match game {
            GameId::TwinWords => Self::new(game.as_str(), "confusability", 1.0, 1.0, 5.0, 0.5),
            GameId::Schulte => Self::new(game.as_str(), "gridSize", 3.0, 3.0, 8.0, 0.5),
            GameId::ParImpar => Self::new(game.as_str(), "exposureMs", 1500.0, 200.0, 3000.0, 100.0),
            GameId::MemoryDigits => {
                Self::new(game.as_str(), "sequenceLength", 4.0, 3.0, 12.0, 0.5)
            }
            GameId::WordSearch => Self::new(game.as_str(), "complexity", 1.0, 1.0, 5.0, 0.5),
            _ => return None,
        };
        Some(config)
    }

    pub fn staircase(&self, initial_value: f64) -> StaircaseState {
        StaircaseState::new(initial_value, self.min_value, self.max_value, self.step_size)
    }
}

/// Registry of adaptation configs keyed by game id.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibrator {
    configs: BTreeMap<String, AdaptationConfig>,
}

impl Default for Calibrator {
    fn default() -> Self {
        let configs = GameId::ALL
            .into_iter()
            .filter_map(AdaptationConfig::builtin)
            .map(|c| (c.game_id.clone(), c))
            .collect();
        Self { configs }
    }
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-ins with `overrides` layered on top.
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = &'a AdaptationConfig>) -> Self {
        let mut calibrator = Self::default();
        for config in overrides {
            calibrator.register(config.clone());
        }
        calibrator
    }

    /// Add or replace the tunable for `config.game_id`.
    pub fn register(&mut self, config: AdaptationConfig) {
        self.configs.insert(config.game_id.clone(), config);
    }

    pub fn config(&self, game_id: &str) -> Option<&AdaptationConfig> {
        self.configs.get(game_id)
    }

    pub fn configs(&self) -> impl Iterator<Item = &AdaptationConfig> {
        self.configs.values()
    }

    /// Replay stored sessions through a fresh staircase.
    ///
    /// Returns `None` for unknown games or when fewer than
    /// [`MIN_CALIBRATION_SESSIONS`] of the last sessions report an accuracy.
    pub fn calibrate(
        &self,
        game_id: &str,
        recent_sessions: &[SessionSummary],
        default_value: Option<f64>,
    ) -> Option<StaircaseState> {
        let config = self.config(game_id)?;
        let start = recent_sessions.len().saturating_sub(RECENT_WINDOW);
        let trials: Vec<f64> = recent_sessions[start..]
            .iter()
            .filter_map(|s| s.accuracy)
            .collect();
        if trials.len() < MIN_CALIBRATION_SESSIONS {
            return None;
        }

        let mut staircase = config.staircase(default_value.unwrap_or(config.initial_value));
        for accuracy in trials {
            staircase.apply(accuracy >= config.target_accuracy);
        }
        tracing::debug!(
            game_id,
            level = staircase.current_level,
            reversals = staircase.reversals,
            "calibrated from session history"
        );
        Some(staircase)
    }

    /// Calibrated value of the game's tunable, rounded to one decimal.
    ///
    /// Unknown games get `default_value` (or 1); thin history gets
    /// `default_value` or the configured initial value.
    pub fn adapted_parameter(
        &self,
        game_id: &str,
        recent_sessions: &[SessionSummary],
        default_value: Option<f64>,
    ) -> f64 {
        let Some(config) = self.config(game_id) else {
            return default_value.unwrap_or(1.0);
        };
        match self.calibrate(game_id, recent_sessions, default_value) {
            Some(staircase) => round_tenth(staircase.current_level),
            None => default_value.unwrap_or(config.initial_value),
        }
    }

    pub fn twin_words(&self, recent: &[SessionSummary]) -> TwinWordsParams {
        TwinWordsParams::from_level(self.adapted_parameter(GameId::TwinWords.as_str(), recent, Some(1.0)))
    }

    pub fn schulte(&self, recent: &[SessionSummary]) -> SchulteParams {
        SchulteParams::from_level(self.adapted_parameter(GameId::Schulte.as_str(), recent, Some(3.0)))
    }

    pub fn par_impar(&self, recent: &[SessionSummary]) -> ParImparParams {
        ParImparParams::from_level(self.adapted_parameter(GameId::ParImpar.as_str(), recent, Some(1500.0)))
    }

    pub fn memory_digits(&self, recent: &[SessionSummary]) -> MemoryDigitsParams {
        MemoryDigitsParams::from_level(self.adapted_parameter(
            GameId::MemoryDigits.as_str(),
            recent,
            Some(4.0),
        ))
    }

    pub fn word_search(&self, recent: &[SessionSummary]) -> WordSearchParams {
        WordSearchParams::from_level(self.adapted_parameter(GameId::WordSearch.as_str(), recent, Some(1.0)))
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwinWordsParams {
    pub use_confusable_fonts: bool,
    pub use_accents: bool,
    /// Seconds multiplier; shrinks as confusability rises.
    pub time_pressure: f64,
}

impl TwinWordsParams {
    pub fn from_level(level: f64) -> Self {
        Self {
            use_confusable_fonts: level >= 2.0,
            use_accents: level >= 3.0,
            time_pressure: (2.0 - level * 0.3).max(0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchulteParams {
    pub grid_size: u32,
    pub exposure_time_ms: f64,
}

impl SchulteParams {
    pub fn from_level(level: f64) -> Self {
        Self {
            grid_size: level.round().clamp(3.0, 8.0) as u32,
            exposure_time_ms: (2000.0 - level * 200.0).max(500.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParImparParams {
    pub exposure_ms: f64,
    /// 1 (plain) .. 3 (densest); rises as exposure gets shorter.
    pub grid_complexity: u32,
}

impl ParImparParams {
    pub fn from_level(level: f64) -> Self {
        let exposure_ms = level.clamp(200.0, 3000.0);
        let grid_complexity = if exposure_ms < 500.0 {
            3
        } else if exposure_ms < 800.0 {
            2
        } else {
            1
        };
        Self {
            exposure_ms,
            grid_complexity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDigitsParams {
    pub sequence_length: u32,
    pub presentation_speed_ms: f64,
}

impl MemoryDigitsParams {
    pub fn from_level(level: f64) -> Self {
        Self {
            sequence_length: level.round().clamp(3.0, 12.0) as u32,
            presentation_speed_ms: (1000.0 - level * 50.0).max(400.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSearchParams {
    pub allow_diagonals: bool,
    pub allow_reverse: bool,
    pub grid_size: u32,
    pub word_count: u32,
}

impl WordSearchParams {
    pub fn from_level(level: f64) -> Self {
        Self {
            allow_diagonals: level >= 2.0,
            allow_reverse: level >= 3.0,
            grid_size: (8.0 + level.floor()).clamp(8.0, 15.0) as u32,
            word_count: (3.0 + (level / 1.5).floor()).clamp(3.0, 10.0) as u32,
        }
    }
}

/// Mean accuracy over the last `window` sessions; missing accuracy counts as 0.
pub fn moving_accuracy(sessions: &[SessionSummary], window: usize) -> f64 {
    let start = sessions.len().saturating_sub(window.max(1));
    let tail = &sessions[start..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().map(|s| s.accuracy.unwrap_or(0.0)).sum::<f64>() / tail.len() as f64
}

/// Coarse too-easy / too-hard signal for games without a staircase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyHint {
    pub should_increase: bool,
    pub should_decrease: bool,
    pub current_accuracy: f64,
}

pub fn difficulty_hint(sessions: &[SessionSummary], window: usize) -> DifficultyHint {
    let accuracy = moving_accuracy(sessions, window);
    DifficultyHint {
        should_increase: accuracy > 0.85,
        should_decrease: accuracy < 0.70,
        current_accuracy: accuracy,
    }
}

/// Trials per minute of session time. Zero when no time has elapsed.
pub fn items_per_minute(trials: u32, elapsed_sec: f64) -> f64 {
    if elapsed_sec > 0.0 {
        trials as f64 / elapsed_sec * 60.0
    } else {
        0.0
    }
}

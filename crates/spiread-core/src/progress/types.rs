use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Number of session summaries retained per game.
pub const RECENT_WINDOW: usize = 10;

/// The mini-games shipped with Spiread.
///
/// Stored records are keyed by plain strings, so games outside this list
/// still get progress tracking; this enum names the ones the adaptive
/// registry and the achievement catalog know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    Schulte,
    TwinWords,
    ParImpar,
    MemoryDigits,
    RunningWords,
    LettersGrid,
    WordSearch,
    Anagrams,
    RsvpReader,
}

impl GameId {
    pub const ALL: [GameId; 9] = [
        GameId::Schulte,
        GameId::TwinWords,
        GameId::ParImpar,
        GameId::MemoryDigits,
        GameId::RunningWords,
        GameId::LettersGrid,
        GameId::WordSearch,
        GameId::Anagrams,
        GameId::RsvpReader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::Schulte => "schulte",
            GameId::TwinWords => "twin_words",
            GameId::ParImpar => "par_impar",
            GameId::MemoryDigits => "memory_digits",
            GameId::RunningWords => "running_words",
            GameId::LettersGrid => "letters_grid",
            GameId::WordSearch => "word_search",
            GameId::Anagrams => "anagrams",
            GameId::RsvpReader => "rsvp_reader",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "game_id".into(),
                message: format!("unknown game '{s}'"),
            })
    }
}

/// Outcome of one completed session. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub game_id: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    /// 0.0 ..= 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub duration_sec: f64,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,
}

impl SessionSummary {
    pub fn new(game_id: impl Into<String>, score: f64, duration_sec: f64, timestamp: i64) -> Self {
        Self {
            game_id: game_id.into(),
            score,
            level: None,
            streak: None,
            accuracy: None,
            duration_sec,
            timestamp,
            extras: None,
        }
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_streak(mut self, streak: u32) -> Self {
        self.streak = Some(streak);
        self
    }

    /// Accuracy is clamped into `0.0..=1.0`; NaN is dropped.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = (!accuracy.is_nan()).then(|| accuracy.clamp(0.0, 1.0));
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Numeric extra, if present and numeric.
    pub fn extra_f64(&self, key: &str) -> Option<f64> {
        self.extras.as_ref()?.get(key)?.as_f64()
    }
}

/// Durable per-game record.
///
/// Fields missing from an older stored record fall back to the default,
/// so adding a field never invalidates saved progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameProgress {
    pub best_score: f64,
    pub best_level: f64,
    pub best_streak: u32,
    pub last_played_at: i64,
    pub total_sessions: u64,
    pub total_time_sec: f64,
    /// Newest last, at most [`RECENT_WINDOW`] entries.
    pub recent_sessions: Vec<SessionSummary>,
}

impl Default for GameProgress {
    fn default() -> Self {
        Self {
            best_score: 0.0,
            best_level: 1.0,
            best_streak: 0,
            last_played_at: 0,
            total_sessions: 0,
            total_time_sec: 0.0,
            recent_sessions: Vec::new(),
        }
    }
}

impl GameProgress {
    /// Fold one session into this record.
    ///
    /// Bests are maxima over every session ever recorded; totals are
    /// incremented rather than recomputed from the window.
    pub fn record(&self, summary: &SessionSummary) -> GameProgress {
        let mut recent_sessions = self.recent_sessions.clone();
        recent_sessions.push(summary.clone());
        if recent_sessions.len() > RECENT_WINDOW {
            recent_sessions.drain(..recent_sessions.len() - RECENT_WINDOW);
        }

        GameProgress {
            best_score: self.best_score.max(summary.score),
            best_level: self.best_level.max(summary.level.unwrap_or(1.0)),
            best_streak: self.best_streak.max(summary.streak.unwrap_or(0)),
            last_played_at: summary.timestamp,
            total_sessions: self.total_sessions + 1,
            total_time_sec: self.total_time_sec + summary.duration_sec.max(0.0),
            recent_sessions,
        }
    }

    pub fn has_played(&self) -> bool {
        self.total_sessions > 0
    }
}

/// Earned badge ids plus the time of the last evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserAchievements {
    pub earned_badges: Vec<String>,
    pub last_checked_at: i64,
}

impl UserAchievements {
    pub fn has(&self, badge_id: &str) -> bool {
        self.earned_badges.iter().any(|id| id == badge_id)
    }

    /// Add ids not already present, keeping earn order.
    pub fn merge<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if !self.has(&id) {
                self.earned_badges.push(id);
            }
        }
    }
}

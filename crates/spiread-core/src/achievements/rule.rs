//! Unlock conditions.
//!
//! Rules are data rather than closures so the catalog can be listed,
//! serialized, and checked for partial progress by the same code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::progress::{AggregateProgress, GameId};

/// Condition that unlocks a badge, evaluated against an [`AggregateProgress`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementRule {
    /// At least `count` retained sessions no longer than `max_duration_sec`.
    FastSessions { count: u32, max_duration_sec: f64 },

    /// Mean of an extra over one game's sessions stays under `below`.
    /// Sessions without the extra count as `missing`.
    MeanExtraBelow {
        game_id: GameId,
        key: String,
        below: f64,
        missing: f64,
    },

    /// `count` consecutive sessions at full accuracy.
    PerfectRun { count: u32 },

    /// Mean accuracy at or above `min_accuracy` over at least
    /// `min_sessions` sessions that report accuracy.
    MeanAccuracy { min_sessions: u32, min_accuracy: f64 },

    /// Lifetime session count.
    TotalSessions { count: u64 },

    /// Lifetime session count, with every retained session scoring above zero.
    ScoredSessions { count: u64 },

    /// One session of `game_id` meets every extra threshold.
    SessionExtras {
        game_id: GameId,
        at_least: BTreeMap<String, f64>,
    },

    /// Every known game has been played.
    AllGamesPlayed,

    /// Some game reached `level`.
    BestLevel { level: f64 },

    /// Sessions on `days` consecutive calendar days.
    DayStreak { days: u32 },
}

impl AchievementRule {
    pub fn is_satisfied(&self, progress: &AggregateProgress) -> bool {
        match self {
            AchievementRule::FastSessions {
                count,
                max_duration_sec,
            } => fast_sessions(progress, *max_duration_sec) >= *count as usize,
            AchievementRule::MeanExtraBelow {
                game_id,
                key,
                below,
                missing,
            } => {
                let values: Vec<f64> = progress
                    .sessions_for(game_id.as_str())
                    .map(|s| s.extra_f64(key).unwrap_or(*missing))
                    .collect();
                !values.is_empty() && values.iter().sum::<f64>() / (values.len() as f64) < *below
            }
            AchievementRule::PerfectRun { count } => longest_perfect_run(progress) >= *count,
            AchievementRule::MeanAccuracy {
                min_sessions,
                min_accuracy,
            } => {
                let rated = progress.sessions.iter().filter(|s| s.accuracy.is_some()).count();
                rated >= *min_sessions as usize
                    && progress.mean_accuracy.is_some_and(|mean| mean >= *min_accuracy)
            }
            AchievementRule::TotalSessions { count } => progress.total_sessions >= *count,
            AchievementRule::ScoredSessions { count } => {
                progress.total_sessions >= *count && progress.sessions.iter().all(|s| s.score > 0.0)
            }
            AchievementRule::SessionExtras { game_id, at_least } => progress
                .sessions_for(game_id.as_str())
                .any(|s| {
                    at_least
                        .iter()
                        .all(|(key, min)| s.extra_f64(key).unwrap_or(0.0) >= *min)
                }),
            AchievementRule::AllGamesPlayed => games_played(progress) == GameId::ALL.len(),
            AchievementRule::BestLevel { level } => {
                progress.games.values().any(|g| g.best_level >= *level)
            }
            AchievementRule::DayStreak { days } => progress.longest_day_streak() >= *days,
        }
    }

    /// How far along the rule is, as `(achieved, target)`.
    /// `None` for rules that are simply met or not.
    pub fn counted(&self, progress: &AggregateProgress) -> Option<(f64, f64)> {
        let counted = match self {
            AchievementRule::FastSessions {
                count,
                max_duration_sec,
            } => (fast_sessions(progress, *max_duration_sec) as f64, f64::from(*count)),
            AchievementRule::PerfectRun { count } => {
                (f64::from(longest_perfect_run(progress)), f64::from(*count))
            }
            AchievementRule::TotalSessions { count } | AchievementRule::ScoredSessions { count } => {
                (progress.total_sessions as f64, *count as f64)
            }
            AchievementRule::AllGamesPlayed => {
                (games_played(progress) as f64, GameId::ALL.len() as f64)
            }
            AchievementRule::DayStreak { days } => {
                (f64::from(progress.longest_day_streak()), f64::from(*days))
            }
            AchievementRule::MeanExtraBelow { .. }
            | AchievementRule::MeanAccuracy { .. }
            | AchievementRule::SessionExtras { .. }
            | AchievementRule::BestLevel { .. } => return None,
        };
        Some(counted)
    }
}

fn fast_sessions(progress: &AggregateProgress, max_duration_sec: f64) -> usize {
    progress
        .sessions
        .iter()
        .filter(|s| s.duration_sec <= max_duration_sec)
        .count()
}

fn longest_perfect_run(progress: &AggregateProgress) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    for session in &progress.sessions {
        if session.accuracy.is_some_and(|a| a >= 1.0) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

fn games_played(progress: &AggregateProgress) -> usize {
    GameId::ALL
        .iter()
        .filter(|id| progress.has_played(id.as_str()))
        .count()
}

//! Whole-account view derived from every game's record.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::types::{GameProgress, SessionSummary};

const SECONDS_PER_DAY: i64 = 86_400;

/// Derived, never persisted. Rebuilt for every achievement evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateProgress {
    pub games: BTreeMap<String, GameProgress>,
    /// Every retained session across games, newest first.
    pub sessions: Vec<SessionSummary>,
    /// Lifetime counts, not limited to the retained windows.
    pub total_sessions: u64,
    pub total_time_sec: f64,
    /// Mean over retained sessions that carry an accuracy.
    pub mean_accuracy: Option<f64>,
    pub earned_badges: BTreeSet<String>,
    pub utc_offset_secs: i32,
}

impl AggregateProgress {
    pub fn new(
        games: BTreeMap<String, GameProgress>,
        earned_badges: impl IntoIterator<Item = String>,
        utc_offset_secs: i32,
    ) -> Self {
        let mut sessions: Vec<SessionSummary> = games
            .values()
            .flat_map(|g| g.recent_sessions.iter().cloned())
            .collect();
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let accuracies: Vec<f64> = sessions.iter().filter_map(|s| s.accuracy).collect();
        let mean_accuracy = (!accuracies.is_empty())
            .then(|| accuracies.iter().sum::<f64>() / accuracies.len() as f64);

        Self {
            total_sessions: games.values().map(|g| g.total_sessions).sum(),
            total_time_sec: games.values().map(|g| g.total_time_sec).sum(),
            games,
            sessions,
            mean_accuracy,
            earned_badges: earned_badges.into_iter().collect(),
            utc_offset_secs,
        }
    }

    /// Retained sessions of one game, newest first.
    pub fn sessions_for<'a>(&'a self, game_id: &'a str) -> impl Iterator<Item = &'a SessionSummary> {
        self.sessions.iter().filter(move |s| s.game_id == game_id)
    }

    pub fn has_played(&self, game_id: &str) -> bool {
        self.games.get(game_id).is_some_and(GameProgress::has_played)
    }

    /// Calendar day of an epoch-ms timestamp at this aggregate's offset.
    pub fn day_index(&self, timestamp_ms: i64) -> i64 {
        (timestamp_ms.div_euclid(1000) + i64::from(self.utc_offset_secs)).div_euclid(SECONDS_PER_DAY)
    }

    /// Longest run of consecutive calendar days with at least one session.
    pub fn longest_day_streak(&self) -> u32 {
        let days: BTreeSet<i64> = self.sessions.iter().map(|s| self.day_index(s.timestamp)).collect();
        let mut longest = 0;
        let mut run = 0;
        let mut previous: Option<i64> = None;
        for day in days {
            run = match previous {
                Some(p) if day - p == 1 => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            previous = Some(day);
        }
        longest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn game(sessions: Vec<SessionSummary>) -> GameProgress {
        sessions
            .iter()
            .fold(GameProgress::default(), |progress, s| progress.record(s))
    }

    #[test]
    fn flattens_sessions_newest_first() {
        let mut games = BTreeMap::new();
        games.insert(
            "schulte".to_string(),
            game(vec![
                SessionSummary::new("schulte", 1.0, 10.0, 100),
                SessionSummary::new("schulte", 2.0, 10.0, 300),
            ]),
        );
        games.insert(
            "anagrams".to_string(),
            game(vec![SessionSummary::new("anagrams", 3.0, 20.0, 200).with_accuracy(0.5)]),
        );
        let agg = AggregateProgress::new(games, Vec::new(), 0);
        let order: Vec<i64> = agg.sessions.iter().map(|s| s.timestamp).collect();
        assert_eq!(order, vec![300, 200, 100]);
        assert_eq!(agg.total_sessions, 3);
        assert_eq!(agg.total_time_sec, 40.0);
        assert_eq!(agg.mean_accuracy, Some(0.5));
        assert_eq!(agg.sessions_for("schulte").count(), 2);
        assert!(agg.has_played("anagrams"));
        assert!(!agg.has_played("rsvp_reader"));
    }

    #[test]
    fn lifetime_totals_outlive_the_window() {
        let sessions = (0..25)
            .map(|i| SessionSummary::new("schulte", 1.0, 1.0, i))
            .collect();
        let mut games = BTreeMap::new();
        games.insert("schulte".to_string(), game(sessions));
        let agg = AggregateProgress::new(games, Vec::new(), 0);
        assert_eq!(agg.sessions.len(), 10);
        assert_eq!(agg.total_sessions, 25);
    }

    #[test]
    fn day_streak_counts_consecutive_days_once() {
        let mut sessions: Vec<SessionSummary> = (0..4)
            .map(|d| SessionSummary::new("schulte", 1.0, 1.0, d * DAY_MS + 1_000))
            .collect();
        // Same day twice, then a gap.
        sessions.push(SessionSummary::new("schulte", 1.0, 1.0, 3 * DAY_MS + 5_000));
        sessions.push(SessionSummary::new("schulte", 1.0, 1.0, 9 * DAY_MS));
        let mut games = BTreeMap::new();
        games.insert("schulte".to_string(), game(sessions));
        assert_eq!(AggregateProgress::new(games, Vec::new(), 0).longest_day_streak(), 4);
    }

    #[test]
    fn offset_moves_day_boundaries() {
        let agg = AggregateProgress::new(BTreeMap::new(), Vec::new(), -3600);
        // 00:30 UTC is still the previous day one hour west.
        assert_eq!(agg.day_index(DAY_MS + 30 * 60 * 1000), 0);
        let utc = AggregateProgress::new(BTreeMap::new(), Vec::new(), 0);
        assert_eq!(utc.day_index(DAY_MS + 30 * 60 * 1000), 1);
        assert_eq!(utc.longest_day_streak(), 0);
    }
}

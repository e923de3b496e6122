use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::rule::AchievementRule;
use crate::progress::GameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Speed,
    Accuracy,
    Endurance,
    Mastery,
    Exploration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl fmt::Display for BadgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BadgeCategory::Speed => "speed",
            BadgeCategory::Accuracy => "accuracy",
            BadgeCategory::Endurance => "endurance",
            BadgeCategory::Mastery => "mastery",
            BadgeCategory::Exploration => "exploration",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        };
        f.write_str(s)
    }
}

/// Catalog entry. Only the id is ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub rarity: Rarity,
    pub rule: AchievementRule,
}

impl Badge {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        icon: &str,
        category: BadgeCategory,
        rarity: Rarity,
        rule: AchievementRule,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
            category,
            rarity,
            rule,
        }
    }
}

fn thresholds<const N: usize>(pairs: [(&str, f64); N]) -> BTreeMap<String, f64> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// The built-in badge catalog, in display order.
pub fn catalog() -> Vec<Badge> {
    use AchievementRule as R;
    use BadgeCategory::*;

    vec![
        Badge::new(
            "speed_demon",
            "Speed Demon",
            "Finish 10 sessions in 30 seconds or less",
            "⚡",
            Speed,
            Rarity::Rare,
            R::FastSessions {
                count: 10,
                max_duration_sec: 30.0,
            },
        ),
        Badge::new(
            "lightning_reflexes",
            "Lightning Reflexes",
            "Average reaction time under 400 ms in Par/Impar",
            "⚡",
            Speed,
            Rarity::Epic,
            R::MeanExtraBelow {
                game_id: GameId::ParImpar,
                key: "avgRT".into(),
                below: 400.0,
                missing: 1000.0,
            },
        ),
        Badge::new(
            "perfectionist",
            "Perfectionist",
            "Reach 100% accuracy in 5 consecutive sessions",
            "🎯",
            Accuracy,
            Rarity::Epic,
            R::PerfectRun { count: 5 },
        ),
        Badge::new(
            "sharpshooter",
            "Sharpshooter",
            "Average 95%+ accuracy across your games",
            "🏹",
            Accuracy,
            Rarity::Rare,
            R::MeanAccuracy {
                min_sessions: 10,
                min_accuracy: 0.95,
            },
        ),
        Badge::new(
            "marathon_runner",
            "Marathon Runner",
            "Play 100 sessions in total",
            "🏃",
            Endurance,
            Rarity::Common,
            R::TotalSessions { count: 100 },
        ),
        Badge::new(
            "iron_mind",
            "Iron Mind",
            "Complete 50 training sessions without a zero score",
            "🧠",
            Endurance,
            Rarity::Legendary,
            R::ScoredSessions { count: 50 },
        ),
        Badge::new(
            "digit_master_100",
            "Digit Master",
            "Memorize sequences of 7+ digits in Memory Digits",
            "🔢",
            Mastery,
            Rarity::Epic,
            R::SessionExtras {
                game_id: GameId::MemoryDigits,
                at_least: thresholds([("maxSequenceLength", 7.0)]),
            },
        ),
        Badge::new(
            "word_hunter_50",
            "Word Hunter",
            "Find 50+ words in one Word Search session",
            "🔍",
            Mastery,
            Rarity::Rare,
            R::SessionExtras {
                game_id: GameId::WordSearch,
                at_least: thresholds([("totalWordsFound", 50.0)]),
            },
        ),
        Badge::new(
            "speed_reader",
            "Speed Reader",
            "Read at 600+ WPM in RSVP with 80%+ comprehension",
            "📚",
            Mastery,
            Rarity::Legendary,
            R::SessionExtras {
                game_id: GameId::RsvpReader,
                at_least: thresholds([("wpm", 600.0), ("comprehensionScore", 0.8)]),
            },
        ),
        Badge::new(
            "game_explorer",
            "Game Explorer",
            "Play every available game",
            "🗺️",
            Exploration,
            Rarity::Common,
            R::AllGamesPlayed,
        ),
        Badge::new(
            "level_climber",
            "Level Climber",
            "Reach level 10+ in any game",
            "🏔️",
            Exploration,
            Rarity::Rare,
            R::BestLevel { level: 10.0 },
        ),
        Badge::new(
            "streak_master",
            "Streak Master",
            "Train on 7 consecutive days",
            "🔥",
            Exploration,
            Rarity::Epic,
            R::DayStreak { days: 7 },
        ),
    ]
}

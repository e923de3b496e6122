//! Badge catalog and unlock evaluation.
//!
//! Evaluation is a pure function of the aggregate view and the ids already
//! earned; callers persist the union themselves (see `TrainingEngine`).

mod badge;
mod rule;

pub use badge::{catalog, Badge, BadgeCategory, Rarity};
pub use rule::AchievementRule;

use crate::progress::AggregateProgress;

/// Progress shown for a counting rule that is not yet met.
const UNMET_CEILING: f64 = 0.99;

/// Badges in `badges` whose rule holds now and whose id is not in `earned`.
///
/// Same inputs always give the same answer, so calling this again after
/// persisting the result returns nothing new.
pub fn check_new_achievements<'a, S: AsRef<str>>(
    badges: &'a [Badge],
    progress: &AggregateProgress,
    earned: &[S],
) -> Vec<&'a Badge> {
    badges
        .iter()
        .filter(|badge| !earned.iter().any(|id| id.as_ref() == badge.id))
        .filter(|badge| badge.rule.is_satisfied(progress))
        .collect()
}

/// Completion in `0.0..=1.0`. Exactly 1.0 only once the badge is satisfied.
pub fn achievement_progress(badge: &Badge, progress: &AggregateProgress) -> f64 {
    if badge.rule.is_satisfied(progress) {
        return 1.0;
    }
    match badge.rule.counted(progress) {
        Some((achieved, target)) if target > 0.0 => (achieved / target).clamp(0.0, UNMET_CEILING),
        _ => 0.0,
    }
}

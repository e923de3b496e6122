use clap::Subcommand;
use serde_json::json;
use spiread_core::achievement_progress;

use crate::common::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// List the catalog with earned state and progress
    List,
    /// Evaluate stored progress and record new unlocks
    Check,
}

pub fn run(action: AchievementsAction) -> CliResult {
    let (mut engine, _) = open_engine()?;

    match action {
        AchievementsAction::List => {
            let aggregate = engine.store().get_overall_progress();
            let rows: Vec<serde_json::Value> = engine
                .catalog()
                .iter()
                .map(|badge| {
                    json!({
                        "id": badge.id,
                        "name": badge.name,
                        "icon": badge.icon,
                        "category": badge.category,
                        "rarity": badge.rarity,
                        "earned": aggregate.earned_badges.contains(&badge.id),
                        "progress": achievement_progress(badge, &aggregate),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        AchievementsAction::Check => {
            let unlocked: Vec<String> = engine
                .evaluate_achievements()
                .into_iter()
                .map(|b| b.id)
                .collect();
            print_json(&unlocked)?;
        }
    }
    Ok(())
}

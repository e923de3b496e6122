use clap::Subcommand;
use serde_json::json;
use spiread_core::SessionSummary;

use crate::common::{open_engine, parse_extra, print_json, CliResult};

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Show one game's record
    Show {
        /// Game id (e.g. "schulte")
        game: String,
    },
    /// Show every stored game record
    All,
    /// Show the aggregate across games
    Overall,
    /// Record a session without running the timer
    Record {
        game: String,
        #[arg(long)]
        score: f64,
        /// Session length in seconds
        #[arg(long)]
        duration: f64,
        #[arg(long)]
        accuracy: Option<f64>,
        #[arg(long)]
        level: Option<f64>,
        #[arg(long)]
        streak: Option<u32>,
        /// Epoch milliseconds (now when omitted)
        #[arg(long)]
        timestamp: Option<i64>,
        /// Game-specific extra, as key=value (repeatable)
        #[arg(long = "extra", value_parser = parse_extra)]
        extras: Vec<(String, serde_json::Value)>,
    },
    /// Delete one game's record, or everything with --all
    Reset {
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        game: Option<String>,
        #[arg(long)]
        all: bool,
    },
}

pub fn run(action: ProgressAction) -> CliResult {
    let (mut engine, _) = open_engine()?;

    match action {
        ProgressAction::Show { game } => {
            print_json(&engine.store().get_game_progress(&game))?;
        }
        ProgressAction::All => {
            print_json(&engine.store().get_all_games_progress())?;
        }
        ProgressAction::Overall => {
            print_json(&engine.store().get_overall_progress())?;
        }
        ProgressAction::Record {
            game,
            score,
            duration,
            accuracy,
            level,
            streak,
            timestamp,
            extras,
        } => {
            let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            let mut summary = SessionSummary::new(game.clone(), score, duration, timestamp);
            summary.level = level;
            summary.streak = streak;
            if let Some(accuracy) = accuracy {
                summary = summary.with_accuracy(accuracy);
            }
            for (key, value) in extras {
                summary = summary.with_extra(key, value);
            }

            let progress = engine.store_mut().update_game_progress(&game, &summary)?;
            let new_badges: Vec<String> = engine
                .evaluate_achievements()
                .into_iter()
                .map(|b| b.id)
                .collect();
            print_json(&json!({ "progress": progress, "newBadges": new_badges }))?;
        }
        ProgressAction::Reset { game, all } => {
            if all {
                engine.store_mut().reset_all_progress();
                println!("all progress reset");
            } else if let Some(game) = game {
                engine.store_mut().reset_game_progress(&game)?;
                println!("progress reset: {game}");
            }
        }
    }
    Ok(())
}

use std::sync::Arc;

use clap::Subcommand;
use spiread_core::timer::run_to_end;
use spiread_core::{Config, SessionDraft, SessionTimer, SystemClock};

use crate::common::{open_engine, parse_extra, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Count down in the foreground and print events as JSON lines
    Run {
        /// Session length in seconds (config default when omitted)
        #[arg(long)]
        duration: Option<f64>,
        /// Record the finished session for this game
        #[arg(long)]
        game: Option<String>,
        /// Score to record
        #[arg(long, default_value = "0")]
        score: f64,
        /// Accuracy to record (0..1)
        #[arg(long, requires = "game")]
        accuracy: Option<f64>,
        /// Level reached
        #[arg(long, requires = "game")]
        level: Option<f64>,
        /// Longest streak in the session
        #[arg(long, requires = "game")]
        streak: Option<u32>,
        /// Game-specific extra, as key=value (repeatable)
        #[arg(long = "extra", value_parser = parse_extra, requires = "game")]
        extras: Vec<(String, serde_json::Value)>,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    match action {
        TimerAction::Run {
            duration,
            game,
            score,
            accuracy,
            level,
            streak,
            extras,
        } => {
            let config = Config::load_or_default();
            let mut timer = SessionTimer::new(
                config.timer.session(duration),
                Arc::new(SystemClock::new()),
            );

            if let Some(started) = timer.start() {
                println!("{}", serde_json::to_string(&started)?);
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            if let Some(ended) = runtime.block_on(run_to_end(&mut timer)) {
                println!("{}", serde_json::to_string(&ended)?);
            }

            let Some(game) = game else {
                return Ok(());
            };
            let mut draft = SessionDraft::new(game, score);
            draft.accuracy = accuracy;
            draft.level = level;
            draft.streak = streak;
            for (key, value) in extras {
                draft = draft.extra(key, value);
            }

            let (mut engine, _) = open_engine()?;
            if let Some(outcome) = engine.finish(&mut timer, draft)? {
                for event in &outcome.events {
                    println!("{}", serde_json::to_string(event)?);
                }
                println!("{}", serde_json::to_string(&outcome)?);
            }
        }
    }
    Ok(())
}

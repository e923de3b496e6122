use clap::Args;
use serde_json::json;
use spiread_core::GameId;

use crate::common::{open_engine, print_json, CliResult};

#[derive(Args)]
pub struct AdaptArgs {
    /// Game id (e.g. "par_impar")
    game: String,
    /// Value to use when history is too thin to calibrate
    #[arg(long)]
    default: Option<f64>,
}

pub fn run(args: AdaptArgs) -> CliResult {
    let (engine, _) = open_engine()?;
    let calibrator = engine.calibrator();
    let recent = engine.store().get_game_progress(&args.game).recent_sessions;
    let value = calibrator.adapted_parameter(&args.game, &recent, args.default);

    let params = match args.game.parse::<GameId>() {
        Ok(GameId::TwinWords) => serde_json::to_value(calibrator.twin_words(&recent))?,
        Ok(GameId::Schulte) => serde_json::to_value(calibrator.schulte(&recent))?,
        Ok(GameId::ParImpar) => serde_json::to_value(calibrator.par_impar(&recent))?,
        Ok(GameId::MemoryDigits) => serde_json::to_value(calibrator.memory_digits(&recent))?,
        Ok(GameId::WordSearch) => serde_json::to_value(calibrator.word_search(&recent))?,
        _ => serde_json::Value::Null,
    };

    print_json(&json!({
        "gameId": args.game,
        "parameter": calibrator.config(&args.game).map(|c| c.parameter_name.clone()),
        "value": value,
        "calibrationSessions": recent.iter().filter(|s| s.accuracy.is_some()).count(),
        "params": params,
    }))
}

use clap::Args;
use spiread_core::adaptive::{simulate_staircase, SimulationConfig};
use spiread_core::{Calibrator, Config};

use crate::common::{print_json, CliResult};

#[derive(Args)]
pub struct SimulateArgs {
    /// Game whose tunable to simulate
    game: String,
    #[arg(long, default_value = "200")]
    trials: usize,
    /// Level the simulated player passes half the time (range midpoint by default)
    #[arg(long)]
    ability: Option<f64>,
    #[arg(long, default_value = "1.0")]
    slope: f64,
    #[arg(long)]
    seed: Option<u64>,
    /// Include the level after every trial
    #[arg(long)]
    trajectory: bool,
}

pub fn run(args: SimulateArgs) -> CliResult {
    let config = Config::load_or_default();
    let calibrator = Calibrator::with_overrides(config.adaptation.values());
    let adaptation = calibrator
        .config(&args.game)
        .ok_or_else(|| format!("no adaptation config for '{}'", args.game))?;

    let sim = SimulationConfig {
        trials: args.trials,
        ability: args
            .ability
            .unwrap_or((adaptation.min_value + adaptation.max_value) / 2.0),
        slope: args.slope,
        seed: args.seed,
    };
    let result = simulate_staircase(adaptation, &sim);

    let mut json = serde_json::to_value(&result)?;
    if !args.trajectory {
        if let Some(obj) = json.as_object_mut() {
            obj.remove("trajectory");
        }
    }
    print_json(&json)
}

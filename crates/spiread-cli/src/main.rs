use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "spiread-cli", version, about = "Spiread training engine CLI")]
struct Cli {
    /// Log at debug level (overridden by SPIREAD_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session countdown
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Per-game progress records
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Calibrated difficulty for a game
    Adapt(commands::adapt::AdaptArgs),
    /// Badge catalog and unlocks
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Run a staircase against a simulated player
    Simulate(commands::simulate::SimulateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "spiread_core=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_env("SPIREAD_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Progress { action } => commands::progress::run(action),
        Commands::Adapt(args) => commands::adapt::run(args),
        Commands::Achievements { action } => commands::achievements::run(action),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

//! `spiread-cli config`: inspect and edit `config.toml` in the data dir.
//!
//! Keys are dot paths into the four sections:
//! `timer.*` (session countdown defaults), `storage.*` (progress namespace
//! and database file), `achievements.utc_offset_minutes` (calendar-day
//! bucketing for streak badges) and `adaptation.<game_id>.*` (staircase
//! overrides per game).

use clap::Subcommand;
use serde_json::json;
use spiread_core::Config;

use crate::common::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting, e.g. `timer.max_tick_delta_ms` or `storage.version`
    Get { key: String },
    /// Change one setting and write config.toml
    Set {
        key: String,
        /// Numbers and booleans are parsed; "none" clears the day offset
        value: String,
    },
    /// Print every setting, or one section (timer, storage, achievements, adaptation)
    List { section: Option<String> },
    /// Restore the built-in session, storage and adaptation defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    let config = Config::load()?;
    match action {
        ConfigAction::Get { key } => {
            let value = config.get(&key).ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = config;
            config.set(&key, &value)?;
            tracing::info!(%key, %value, "config updated");
            print_json(&json!({ "key": key, "value": config.get(&key) }))?;
        }
        ConfigAction::List { section: None } => print_json(&config)?,
        ConfigAction::List {
            section: Some(section),
        } => {
            let all = serde_json::to_value(&config)?;
            let part = all
                .get(&section)
                .ok_or_else(|| format!("unknown section: {section}"))?;
            print_json(part)?;
        }
        ConfigAction::Reset => {
            let defaults = Config::default();
            defaults.save()?;
            tracing::info!("config reset to defaults");
            print_json(&defaults)?;
        }
    }
    Ok(())
}

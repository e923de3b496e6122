//! Shared setup for commands that touch stored progress.

use std::sync::Arc;

use spiread_core::storage::Database;
use spiread_core::{Config, SystemClock, TrainingEngine};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Engine over the on-disk database named in the config.
pub fn open_engine() -> CliResult<(TrainingEngine, Config)> {
    let config = Config::load_or_default();
    let db = Database::open_in_data_dir(&config.storage.database)?;
    tracing::debug!(
        database = %config.storage.database,
        namespace = %config.storage.namespace().game_prefix(),
        "progress database opened"
    );
    let engine = TrainingEngine::from_config(&config, db, Arc::new(SystemClock::new()));
    Ok((engine, config))
}

/// Parse `key=value` into a JSON extra; numbers stay numbers.
pub fn parse_extra(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value = serde_json::from_str::<serde_json::Value>(value)
        .ok()
        .filter(|v| v.is_number() || v.is_boolean())
        .unwrap_or_else(|| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extras_keep_numbers_numeric() {
        assert_eq!(parse_extra("wpm=650").unwrap(), ("wpm".into(), serde_json::json!(650)));
        assert_eq!(
            parse_extra("mode=fast").unwrap(),
            ("mode".into(), serde_json::json!("fast"))
        );
        assert!(parse_extra("novalue").is_err());
        assert!(parse_extra("=1").is_err());
    }
}

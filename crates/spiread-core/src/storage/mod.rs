mod config;
pub mod database;
mod memory;
pub mod migrations;

pub use config::{AchievementsConfig, Config, StorageConfig, TimerDefaults};
pub use database::Database;
pub use memory::MemoryBackend;

use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};

/// Synchronous string key-value store behind the progress records.
///
/// Implementations must make a successful `set` visible to the very next
/// `get` on the same backend.
pub trait KvBackend: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

impl<T: KvBackend + ?Sized> KvBackend for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        (**self).keys_with_prefix(prefix)
    }
}

/// Returns the Spiread data directory, creating it if needed.
///
/// `SPIREAD_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/spiread/`, or `~/.config/spiread-dev/` with `SPIREAD_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SPIREAD_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SPIREAD_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("spiread-dev")
            } else {
                base_dir.join("spiread")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

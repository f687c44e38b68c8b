mod config;
pub mod database;
pub mod journal;
pub mod preferences;

pub use config::{AudioConfig, Config, DisplayConfig, SessionTimingConfig};
pub use database::Database;
pub use journal::JournalEntry;
pub use preferences::{KeyValueStore, MemoryStore, Preferences};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `SANCTUAIRE_DATA_DIR` overrides the location. Otherwise this is
/// `~/.config/sanctuaire`, or `~/.config/sanctuaire-dev` when
/// `SANCTUAIRE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("SANCTUAIRE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SANCTUAIRE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("sanctuaire-dev")
            } else {
                base_dir.join("sanctuaire")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(StorageError::DataDir)?;
    Ok(dir)
}

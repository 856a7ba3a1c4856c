mod config;
pub mod database;
mod slot;

pub use config::{Config, DisplayConfig, DistanceUnit, StepsConfig, TimerConfig};
pub use database::{Database, SqliteSlot};
pub use slot::{KvSlot, MemorySlot};

use std::path::PathBuf;

use crate::error::StorageError;

/// Key under which the step history blob is stored.
pub const STEP_HISTORY_KEY: &str = "stepHistory";

/// Key under which the user profile blob is stored.
pub const USER_PROFILE_KEY: &str = "userProfile";

/// Returns the data directory, creating it if needed.
///
/// `FITPULSE_DATA_DIR` wins when set. Otherwise `~/.config/fitpulse[-dev]/`
/// based on `FITPULSE_ENV` (set it to `dev` for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("FITPULSE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FITPULSE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("fitpulse-dev")
            } else {
                base_dir.join("fitpulse")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

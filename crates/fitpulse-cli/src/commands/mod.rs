pub mod config;
pub mod metrics;
pub mod profile;
pub mod steps;
pub mod timer;

use chrono::{DateTime, NaiveDate, Utc};
use fitpulse_core::storage::{Database, STEP_HISTORY_KEY};
use fitpulse_core::{Config, DayBoundary, StepHistoryStore};

/// Open the persisted step history with the configured day boundary.
pub fn open_step_store(config: &Config) -> Result<StepHistoryStore, Box<dyn std::error::Error>> {
    let slot = Database::open()?.slot(STEP_HISTORY_KEY);
    let store = StepHistoryStore::open(slot, DayBoundary::from_config(&config.steps));
    tracing::debug!(days = store.len(), "step history opened");
    Ok(store)
}

/// Accepts `YYYY-MM-DD` (a day on the configured calendar) or RFC 3339.
pub fn parse_date(input: &str, config: &Config) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| format!("cannot parse date '{input}' (expected YYYY-MM-DD or RFC 3339)"))?;
    Ok(DayBoundary::from_config(&config.steps).start_of(day))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

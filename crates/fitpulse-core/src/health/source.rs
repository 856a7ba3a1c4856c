//! The health-data collaborator.
//!
//! A platform sensor API sits behind [`HealthSource`]. Permission problems
//! or missing data come back as `None`, never as errors.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::steps::DailySteps;

/// Callback for live step count updates.
pub type StepCountHandler = Box<dyn Fn(f64) + Send + Sync>;

type SharedHandler = Arc<dyn Fn(f64) + Send + Sync>;

/// Every health data provider implements this trait.
pub trait HealthSource: Send + Sync {
    /// Identifier used in logs and events (e.g. "healthkit", "fixture").
    fn name(&self) -> &str;

    /// Steps taken so far today.
    fn daily_step_total(&self) -> Option<f64>;

    /// One total per day from `since` onwards.
    fn historical_daily_totals(&self, since: DateTime<Utc>) -> Option<Vec<DailySteps>>;

    /// Register for live step count updates.
    fn on_step_count_changed(&self, handler: StepCountHandler);

    /// Walking and running distance today, in meters.
    fn distance_walked_m(&self) -> Option<f64> {
        None
    }

    fn flights_climbed(&self) -> Option<f64> {
        None
    }

    /// Most recent heart rate sample, in beats per minute.
    fn latest_heart_rate_bpm(&self) -> Option<f64> {
        None
    }
}

/// Today's readings as exported by a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayMetrics {
    #[serde(default)]
    pub steps: Option<f64>,
    #[serde(default)]
    pub distance_m: Option<f64>,
    #[serde(default)]
    pub flights_climbed: Option<f64>,
    #[serde(default)]
    pub heart_rate_bpm: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureFile {
    #[serde(default = "default_fixture_name")]
    name: String,
    #[serde(default)]
    today: TodayMetrics,
    #[serde(default)]
    daily_totals: Vec<DailySteps>,
}

fn default_fixture_name() -> String {
    "fixture".to_string()
}

/// A [`HealthSource`] backed by data held in memory.
///
/// Loaded from a JSON export for the CLI, built directly in tests.
///
/// ```json
/// {
///   "today": { "steps": 5230, "distanceM": 3900.5, "flightsClimbed": 4, "heartRateBpm": 72 },
///   "dailyTotals": [ { "date": "2025-01-01T00:00:00Z", "stepCount": 4000 } ]
/// }
/// ```
pub struct FixtureSource {
    name: String,
    available: bool,
    today: Mutex<TodayMetrics>,
    daily_totals: Vec<DailySteps>,
    handlers: Mutex<Vec<SharedHandler>>,
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self {
            name: default_fixture_name(),
            available: true,
            today: Mutex::new(TodayMetrics::default()),
            daily_totals: Vec::new(),
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl FixtureSource {
    /// A source that behaves like one without permission: every query is `None`.
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: false,
            ..Self::default()
        }
    }

    /// # Errors
    /// Returns an error if `json` is not a valid export.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(json)?;
        Ok(Self {
            name: file.name,
            today: Mutex::new(file.today),
            daily_totals: file.daily_totals,
            ..Self::default()
        })
    }

    /// # Errors
    /// Returns an error if the file can't be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "reading health samples");
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_today(self, today: TodayMetrics) -> Self {
        Self {
            today: Mutex::new(today),
            ..self
        }
    }

    pub fn with_daily_totals(self, daily_totals: Vec<DailySteps>) -> Self {
        Self {
            daily_totals,
            ..self
        }
    }

    /// Simulate the sensor reporting a new step count.
    pub fn push_step_count(&self, steps: f64) {
        if !self.available {
            return;
        }
        self.today
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .steps = Some(steps);
        // Handlers run outside the lock so they may register more handlers.
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in &handlers {
            handler(steps);
        }
    }

    fn today(&self) -> Option<TodayMetrics> {
        self.available
            .then(|| *self.today.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl HealthSource for FixtureSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn daily_step_total(&self) -> Option<f64> {
        self.today()?.steps
    }

    fn historical_daily_totals(&self, since: DateTime<Utc>) -> Option<Vec<DailySteps>> {
        if !self.available {
            return None;
        }
        let samples: Vec<DailySteps> = self
            .daily_totals
            .iter()
            .filter(|s| s.date >= since)
            .copied()
            .collect();
        (!samples.is_empty()).then_some(samples)
    }

    fn on_step_count_changed(&self, handler: StepCountHandler) {
        if !self.available {
            return;
        }
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::from(handler));
    }

    fn distance_walked_m(&self) -> Option<f64> {
        self.today()?.distance_m
    }

    fn flights_climbed(&self) -> Option<f64> {
        self.today()?.flights_climbed
    }

    fn latest_heart_rate_bpm(&self) -> Option<f64> {
        self.today()?.heart_rate_bpm
    }
}

//! # FitPulse Core Library
//!
//! This library holds the logic behind the FitPulse fitness tracker. The
//! screens of the app, the health-data platform and the identity provider
//! are collaborators; everything here runs and tests without them. The CLI
//! binary is a thin front end over the same library.
//!
//! ## Architecture
//!
//! - **Countdown timer**: pausable countdown whose superseded runs go inert
//!   via a run token, observable through a `watch` channel
//! - **Step history**: per-day step totals merged last-write-wins and
//!   persisted as one JSON blob
//! - **Health**: the sensor data source trait plus dashboard metrics
//! - **Storage**: SQLite key-value slots and TOML configuration
//!
//! ## Key Components
//!
//! - [`CountdownTimer`]: countdown state machine
//! - [`StepHistoryStore`]: deduplicated-by-day step history
//! - [`HealthSource`]: trait for health data providers
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod health;
pub mod profile;
pub mod steps;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use health::{FixtureSource, HealthMetrics, HealthSource, LiveSteps};
pub use profile::{ProfileStore, UserProfile};
pub use steps::{DailySteps, DayBoundary, DayCalendar, StepHistoryStore, StepRecord};
pub use storage::{Config, Database, KvSlot, MemorySlot};
pub use timer::{CountdownTimer, TimerDuration, TimerState};

mod dashboard;
mod source;

pub use dashboard::{HealthMetrics, LiveSteps, METERS_PER_MILE};
pub use source::{FixtureSource, HealthSource, StepCountHandler, TodayMetrics};

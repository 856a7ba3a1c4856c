//! Per-day step totals and the calendar that decides what a "day" is.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::StepsConfig;

/// Steps attributed to one normalized day.
///
/// Serialized as `{ "id", "date", "stepCount" }` with an RFC 3339 date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub step_count: f64,
}

impl StepRecord {
    /// A new record with a fresh identifier.
    pub fn new(date: DateTime<Utc>, step_count: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            step_count,
        }
    }
}

/// One externally supplied daily total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySteps {
    pub date: DateTime<Utc>,
    pub step_count: f64,
}

impl DailySteps {
    pub fn new(date: DateTime<Utc>, step_count: f64) -> Self {
        Self { date, step_count }
    }
}

/// Maps an instant to the start of its calendar day.
pub trait DayCalendar: Send + Sync {
    fn start_of_day(&self, ts: DateTime<Utc>) -> DateTime<Utc>;

    fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.start_of_day(a) == self.start_of_day(b)
    }
}

/// First representable instant of `day` in `tz`. That is midnight unless a
/// DST jump skips it.
fn first_instant_of<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = day.and_time(NaiveTime::MIN);
    (0..=180)
        .map(|minutes| midnight + chrono::Duration::minutes(minutes))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|start| start.with_timezone(&Utc))
}

fn start_of_day_in<Tz: TimeZone>(tz: &Tz, ts: DateTime<Utc>) -> DateTime<Utc> {
    first_instant_of(tz, ts.with_timezone(tz).date_naive()).unwrap_or(ts)
}

impl DayCalendar for Utc {
    fn start_of_day(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        start_of_day_in(self, ts)
    }
}

impl DayCalendar for Local {
    fn start_of_day(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        start_of_day_in(self, ts)
    }
}

impl DayCalendar for FixedOffset {
    fn start_of_day(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        start_of_day_in(self, ts)
    }
}

/// The day boundary picked by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    /// The system time zone, DST included.
    Local,
    Fixed(FixedOffset),
}

impl DayBoundary {
    pub fn from_config(config: &StepsConfig) -> Self {
        config
            .fixed_offset()
            .map_or(DayBoundary::Local, DayBoundary::Fixed)
    }

    /// Start of a calendar date on this boundary.
    pub fn start_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let start = match self {
            DayBoundary::Local => first_instant_of(&Local, day),
            DayBoundary::Fixed(offset) => first_instant_of(offset, day),
        };
        start.unwrap_or_else(|| day.and_time(NaiveTime::MIN).and_utc())
    }
}

impl DayCalendar for DayBoundary {
    fn start_of_day(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DayBoundary::Local => Local.start_of_day(ts),
            DayBoundary::Fixed(offset) => offset.start_of_day(ts),
        }
    }
}

mod history;
mod record;
mod store;

pub use history::{with_daily_deltas, HistoryEntry};
pub use record::{DailySteps, DayBoundary, DayCalendar, StepRecord};
pub use store::{MergeOutcome, ReconcileSummary, StepHistoryStore, SyncOutcome};

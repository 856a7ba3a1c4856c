use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::RunId;

/// Events describing state changes; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CountdownStarted {
        run_id: RunId,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    CountdownPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    CountdownResumed {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    CountdownReset {
        at: DateTime<Utc>,
    },
    /// The countdown reached zero without being superseded.
    CountdownCompleted {
        run_id: RunId,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    /// A single manual entry was merged into the step history.
    StepsRecorded {
        record_id: Uuid,
        date: DateTime<Utc>,
        step_count: f64,
        inserted: bool,
        at: DateTime<Utc>,
    },
    /// A batch of external samples was merged into the step history.
    StepsReconciled {
        inserted: usize,
        updated: usize,
        skipped: usize,
        at: DateTime<Utc>,
    },
    /// The health source returned nothing, so the sync was a no-op.
    StepSyncSkipped {
        source: String,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::CountdownPaused {
            remaining_secs: 8,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CountdownPaused");
        assert_eq!(json["remaining_secs"], 8);

        let parsed: Event = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }
}

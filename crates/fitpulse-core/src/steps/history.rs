use serde::Serialize;

use super::record::StepRecord;

/// A record prepared for display, with the change since the previous
/// recorded day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: StepRecord,
    /// `None` for the oldest record.
    pub delta: Option<f64>,
}

/// Sort newest first and pair each record with its day-over-day change.
pub fn with_daily_deltas(mut records: Vec<StepRecord>) -> Vec<HistoryEntry> {
    records.sort_by(|a, b| b.date.cmp(&a.date));
    let older: Vec<Option<f64>> = records
        .iter()
        .skip(1)
        .map(|r| Some(r.step_count))
        .chain(std::iter::once(None))
        .collect();

    records
        .into_iter()
        .zip(older)
        .map(|(record, previous)| HistoryEntry {
            delta: previous.map(|p| record.step_count - p),
            record,
        })
        .collect()
}

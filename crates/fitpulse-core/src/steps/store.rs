//! Persisted, deduplicated-by-day step history.
//!
//! Merge rule: for a normalized day with incoming count C, an existing
//! record for that day has its count overwritten with C (its id is kept);
//! otherwise a new record is created. Last write wins, per day.
//!
//! All reads and writes of the record list go through one mutex, and the
//! persistence write happens while it is held, so a background sync and a
//! manual entry can't interleave a read-modify-write.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::record::{DailySteps, DayCalendar, StepRecord};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::health::HealthSource;
use crate::storage::KvSlot;

/// What a single merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted { id: Uuid },
    Updated { id: Uuid },
}

impl MergeOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            MergeOutcome::Inserted { id } | MergeOutcome::Updated { id } => *id,
        }
    }
}

/// Totals for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Samples dropped for carrying a negative or non-finite count.
    pub skipped: usize,
}

impl ReconcileSummary {
    pub fn to_event(&self) -> Event {
        Event::StepsReconciled {
            inserted: self.inserted,
            updated: self.updated,
            skipped: self.skipped,
            at: Utc::now(),
        }
    }
}

/// Result of [`StepHistoryStore::sync_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied(ReconcileSummary),
    /// The source had nothing to offer; history untouched.
    Skipped,
}

struct Inner {
    records: Vec<StepRecord>,
    slot: Box<dyn KvSlot>,
}

pub struct StepHistoryStore {
    inner: Mutex<Inner>,
    calendar: Box<dyn DayCalendar>,
}

impl StepHistoryStore {
    /// Build a store over `slot` and load whatever it holds.
    pub fn open(slot: impl KvSlot + 'static, calendar: impl DayCalendar + 'static) -> Self {
        let store = Self {
            inner: Mutex::new(Inner {
                records: Vec::new(),
                slot: Box::new(slot),
            }),
            calendar: Box::new(calendar),
        };
        store.load();
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// All records, in insertion order.
    pub fn history(&self) -> Vec<StepRecord> {
        self.lock().records.clone()
    }

    /// All records, newest day first.
    pub fn history_desc(&self) -> Vec<StepRecord> {
        let mut records = self.history();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    /// The record for the day containing `date`, if any.
    pub fn record_for(&self, date: DateTime<Utc>) -> Option<StepRecord> {
        let day = self.calendar.start_of_day(date);
        self.lock()
            .records
            .iter()
            .find(|r| self.calendar.start_of_day(r.date) == day)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Merge one manual entry and persist.
    ///
    /// # Errors
    /// Rejects negative or non-finite counts; propagates persistence
    /// write failures (the in-memory merge has already happened by then).
    pub fn record_manual(&self, step_count: f64, date: DateTime<Utc>) -> Result<MergeOutcome> {
        validate_count(step_count)?;
        let mut inner = self.lock();
        let outcome = self.merge(&mut inner.records, date, step_count);
        Self::write(&inner)?;
        Ok(outcome)
    }

    /// Merge a batch of external samples and persist once.
    ///
    /// Invalid samples are skipped and counted rather than failing the
    /// whole batch.
    ///
    /// # Errors
    /// Propagates persistence write failures.
    pub fn reconcile<I>(&self, samples: I) -> Result<ReconcileSummary>
    where
        I: IntoIterator<Item = DailySteps>,
    {
        let mut summary = ReconcileSummary::default();
        let mut inner = self.lock();
        for sample in samples {
            if validate_count(sample.step_count).is_err() {
                tracing::warn!(
                    date = %sample.date,
                    step_count = sample.step_count,
                    "skipping invalid step sample"
                );
                summary.skipped += 1;
                continue;
            }
            match self.merge(&mut inner.records, sample.date, sample.step_count) {
                MergeOutcome::Inserted { .. } => summary.inserted += 1,
                MergeOutcome::Updated { .. } => summary.updated += 1,
            }
        }
        Self::write(&inner)?;
        tracing::debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            "step history reconciled"
        );
        Ok(summary)
    }

    /// Pull daily totals since `since` from `source` and reconcile them.
    ///
    /// # Errors
    /// Propagates persistence write failures. A source with no data is not
    /// an error.
    pub fn sync_from(&self, source: &dyn HealthSource, since: DateTime<Utc>) -> Result<SyncOutcome> {
        match source.historical_daily_totals(since) {
            Some(samples) => {
                let summary = self.reconcile(samples)?;
                tracing::info!(
                    source = source.name(),
                    inserted = summary.inserted,
                    updated = summary.updated,
                    "step history synced"
                );
                Ok(SyncOutcome::Applied(summary))
            }
            None => {
                tracing::info!(source = source.name(), "no step samples available, sync skipped");
                Ok(SyncOutcome::Skipped)
            }
        }
    }

    /// Write the full history to the slot.
    ///
    /// # Errors
    /// Propagates serialization or write failures.
    pub fn persist(&self) -> Result<()> {
        Self::write(&self.lock())
    }

    /// Replace the in-memory history with the slot's contents.
    ///
    /// Missing, unreadable or corrupt data yields an empty history. Stored
    /// records go through the merge rule again, so duplicate days collapse
    /// and invalid counts are dropped.
    pub fn load(&self) {
        let mut inner = self.lock();
        let records = match inner.slot.read() {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<StepRecord>>(&blob) {
                Ok(records) => self.normalize_loaded(records),
                Err(e) => {
                    tracing::warn!(error = %e, "step history is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read step history, starting empty");
                Vec::new()
            }
        };
        inner.records = records;
    }

    /// Drop every record and delete the persisted blob.
    ///
    /// # Errors
    /// Propagates slot failures.
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.slot.clear()?;
        inner.records.clear();
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn merge(&self, records: &mut Vec<StepRecord>, date: DateTime<Utc>, step_count: f64) -> MergeOutcome {
        let day = self.calendar.start_of_day(date);
        if let Some(existing) = records
            .iter_mut()
            .find(|r| self.calendar.start_of_day(r.date) == day)
        {
            existing.date = day;
            existing.step_count = step_count;
            tracing::debug!(%day, step_count, id = %existing.id, "step record updated");
            MergeOutcome::Updated { id: existing.id }
        } else {
            let record = StepRecord::new(day, step_count);
            let id = record.id;
            records.push(record);
            tracing::debug!(%day, step_count, %id, "step record inserted");
            MergeOutcome::Inserted { id }
        }
    }

    /// Re-apply the merge rule to decoded records: one record per day, the
    /// last one for a day wins, invalid counts are dropped. Ids survive.
    fn normalize_loaded(&self, loaded: Vec<StepRecord>) -> Vec<StepRecord> {
        let mut records: Vec<StepRecord> = Vec::with_capacity(loaded.len());
        for mut record in loaded {
            if validate_count(record.step_count).is_err() {
                tracing::warn!(
                    id = %record.id,
                    step_count = record.step_count,
                    "dropping stored step record with invalid count"
                );
                continue;
            }
            let day = self.calendar.start_of_day(record.date);
            match records.iter_mut().find(|r| r.date == day) {
                Some(existing) => {
                    tracing::warn!(%day, kept = %existing.id, dropped = %record.id, "duplicate stored step record for day");
                    existing.step_count = record.step_count;
                }
                None => {
                    record.date = day;
                    records.push(record);
                }
            }
        }
        records
    }

    fn write(inner: &Inner) -> Result<()> {
        let blob = serde_json::to_string(&inner.records)?;
        inner.slot.write(&blob)
    }
}

fn validate_count(step_count: f64) -> Result<(), ValidationError> {
    if !step_count.is_finite() {
        return Err(ValidationError::invalid("step_count", "must be finite"));
    }
    if step_count < 0.0 {
        return Err(ValidationError::invalid("step_count", "must not be negative"));
    }
    Ok(())
}

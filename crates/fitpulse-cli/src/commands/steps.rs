use std::path::PathBuf;

use chrono::{DateTime, Duration, Local, Utc};
use clap::Subcommand;
use fitpulse_core::steps::{with_daily_deltas, MergeOutcome, SyncOutcome};
use fitpulse_core::{Config, DayBoundary, DayCalendar, Event, FixtureSource, HealthSource};

use super::{open_step_store, parse_date, print_json};

#[derive(Subcommand)]
pub enum StepsAction {
    /// Record a manual step count for a day (overwrites that day)
    Record {
        /// Step count
        count: f64,
        /// Day to record for: YYYY-MM-DD or RFC 3339 (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Merge daily totals from a health data export
    Sync {
        /// JSON export with `dailyTotals`
        #[arg(long)]
        samples: PathBuf,
        /// Days to look back (default from config)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show the step history, newest first
    History {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Show at most this many days
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete the whole step history
    Reset,
}

pub fn run(action: StepsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = open_step_store(&config)?;

    match action {
        StepsAction::Record { count, date } => {
            let date = match date {
                Some(input) => parse_date(&input, &config)?,
                None => Utc::now(),
            };
            let outcome = store.record_manual(count, date)?;
            let record = store
                .record_for(date)
                .ok_or("recorded day is missing from history")?;
            print_json(&Event::StepsRecorded {
                record_id: outcome.id(),
                date: record.date,
                step_count: record.step_count,
                inserted: matches!(outcome, MergeOutcome::Inserted { .. }),
                at: Utc::now(),
            })?;
        }
        StepsAction::Sync { samples, days } => {
            let source = FixtureSource::from_path(&samples)?;
            let days = days.unwrap_or(config.steps.sync_lookback_days);
            let calendar = DayBoundary::from_config(&config.steps);
            let since = calendar.start_of_day(Utc::now() - Duration::days(i64::from(days)));

            let event = match store.sync_from(&source, since)? {
                SyncOutcome::Applied(summary) => summary.to_event(),
                SyncOutcome::Skipped => Event::StepSyncSkipped {
                    source: source.name().to_string(),
                    at: Utc::now(),
                },
            };
            print_json(&event)?;
        }
        StepsAction::History { json, limit } => {
            let mut entries = with_daily_deltas(store.history());
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            if json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                println!("No step history yet.");
            } else {
                let boundary = DayBoundary::from_config(&config.steps);
                for entry in &entries {
                    let delta = match entry.delta {
                        Some(d) if d > 0.0 => format!("↑ {}", d.round()),
                        Some(d) if d < 0.0 => format!("↓ {}", d.abs().round()),
                        Some(_) => "=".to_string(),
                        None => String::new(),
                    };
                    println!(
                        "{}  {:>8}  {delta}",
                        format_day(entry.record.date, boundary),
                        entry.record.step_count.round()
                    );
                }
            }
        }
        StepsAction::Reset => {
            store.clear()?;
            println!("step history cleared");
        }
    }
    Ok(())
}

fn format_day(date: DateTime<Utc>, boundary: DayBoundary) -> String {
    match boundary {
        DayBoundary::Local => date.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        DayBoundary::Fixed(offset) => date.with_timezone(&offset).format("%Y-%m-%d").to_string(),
    }
}

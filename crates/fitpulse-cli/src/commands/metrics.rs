use std::path::PathBuf;

use clap::Args;
use fitpulse_core::storage::DistanceUnit;
use fitpulse_core::{Config, FixtureSource, HealthMetrics};

use super::print_json;

#[derive(Args)]
pub struct MetricsArgs {
    /// JSON export with a `today` section
    #[arg(long)]
    samples: PathBuf,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: MetricsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let source = FixtureSource::from_path(&args.samples)?;
    let metrics = HealthMetrics::collect(&source);

    if args.json {
        return print_json(&metrics);
    }

    let unit = config.display.distance_unit;
    let suffix = match unit {
        DistanceUnit::Miles => "mi",
        DistanceUnit::Meters => "m",
    };
    println!("Steps:           {}", show(metrics.steps, 0));
    println!(
        "Distance:        {}",
        metrics
            .distance_in(unit)
            .map_or_else(|| "--".to_string(), |d| format!("{d:.2} {suffix}"))
    );
    println!("Flights Climbed: {}", show(metrics.flights_climbed, 0));
    println!("Heart Rate:      {} BPM", show(metrics.heart_rate_bpm, 0));
    Ok(())
}

fn show(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{v:.precision$}"))
}

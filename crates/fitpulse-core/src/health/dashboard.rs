use serde::Serialize;
use tokio::sync::watch;

use super::source::HealthSource;
use crate::storage::DistanceUnit;

pub const METERS_PER_MILE: f64 = 1609.344;

/// Today's headline numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HealthMetrics {
    pub steps: Option<f64>,
    pub distance_m: Option<f64>,
    pub flights_climbed: Option<f64>,
    pub heart_rate_bpm: Option<f64>,
}

impl HealthMetrics {
    pub fn collect(source: &dyn HealthSource) -> Self {
        Self {
            steps: source.daily_step_total(),
            distance_m: source.distance_walked_m(),
            flights_climbed: source.flights_climbed(),
            heart_rate_bpm: source.latest_heart_rate_bpm(),
        }
    }

    pub fn distance_miles(&self) -> Option<f64> {
        self.distance_m.map(|m| m / METERS_PER_MILE)
    }

    pub fn distance_in(&self, unit: DistanceUnit) -> Option<f64> {
        match unit {
            DistanceUnit::Miles => self.distance_miles(),
            DistanceUnit::Meters => self.distance_m,
        }
    }
}

/// Latest step count as pushed by a source.
pub struct LiveSteps {
    rx: watch::Receiver<Option<f64>>,
}

impl LiveSteps {
    /// Seed with the current total and subscribe to updates.
    pub fn attach(source: &dyn HealthSource) -> Self {
        let (tx, rx) = watch::channel(source.daily_step_total());
        source.on_step_count_changed(Box::new(move |steps| {
            tx.send_replace(Some(steps));
        }));
        Self { rx }
    }

    pub fn latest(&self) -> Option<f64> {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<f64>> {
        self.rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{FixtureSource, TodayMetrics};

    fn source() -> FixtureSource {
        FixtureSource::default().with_today(TodayMetrics {
            steps: Some(5230.0),
            distance_m: Some(1609.344),
            flights_climbed: Some(4.0),
            heart_rate_bpm: None,
        })
    }

    #[test]
    fn collects_every_metric() {
        let metrics = HealthMetrics::collect(&source());
        assert_eq!(metrics.steps, Some(5230.0));
        assert_eq!(metrics.flights_climbed, Some(4.0));
        assert_eq!(metrics.heart_rate_bpm, None);
        assert!((metrics.distance_miles().unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(metrics.distance_in(DistanceUnit::Meters), Some(1609.344));
    }

    #[test]
    fn unavailable_source_gives_empty_metrics() {
        let metrics = HealthMetrics::collect(&FixtureSource::unavailable("healthkit"));
        assert_eq!(metrics, HealthMetrics::default());
        assert!(metrics.distance_miles().is_none());
    }

    #[tokio::test]
    async fn live_steps_follow_pushes() {
        let source = source();
        let live = LiveSteps::attach(&source);
        let mut rx = live.subscribe();
        assert_eq!(live.latest(), Some(5230.0));

        source.push_step_count(5300.0);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(5300.0));
        assert_eq!(live.latest(), Some(5300.0));
    }
}

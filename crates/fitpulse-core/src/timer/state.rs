//! Countdown state and the validated duration it is started with.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::storage::TimerConfig;

/// Opaque token identifying one countdown run.
///
/// Regenerated on every start and reset. A loop that captured an older
/// token treats itself as superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Observable countdown state.
///
/// Invariants: `remaining_secs <= total_secs`, and `paused` implies `running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub running: bool,
    pub paused: bool,
    pub run_id: RunId,
}

impl TimerState {
    pub(crate) fn idle() -> Self {
        Self {
            remaining_secs: 0,
            total_secs: 0,
            running: false,
            paused: false,
            run_id: RunId::new(),
        }
    }

    /// 0.0 .. 1.0 share of the configured duration already elapsed.
    pub fn progress_fraction(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        f64::from(self.total_secs - self.remaining_secs.min(self.total_secs))
            / f64::from(self.total_secs)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::idle()
    }
}

/// A positive countdown length in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TimerDuration(NonZeroU32);

impl TimerDuration {
    /// # Errors
    /// Rejects zero.
    pub fn from_secs(secs: u32) -> Result<Self, ValidationError> {
        NonZeroU32::new(secs)
            .map(Self)
            .ok_or_else(|| ValidationError::invalid("duration", "must be at least one second"))
    }

    /// The configured quick-start duration at `index`.
    ///
    /// # Errors
    /// Rejects an index past the preset list or a preset of zero.
    pub fn preset(index: usize, config: &TimerConfig) -> Result<Self, ValidationError> {
        let secs = config
            .presets
            .get(index)
            .ok_or_else(|| ValidationError::OutOfBounds {
                collection: "timer.presets".to_string(),
                index,
                len: config.presets.len(),
            })?;
        Self::from_secs(*secs)
    }

    /// A user-picked duration, held to the configured range and step.
    ///
    /// # Errors
    /// Rejects values outside `custom_min_secs..=custom_max_secs` or off
    /// the `custom_step_secs` grid.
    pub fn custom(secs: u32, config: &TimerConfig) -> Result<Self, ValidationError> {
        if secs < config.custom_min_secs || secs > config.custom_max_secs {
            return Err(ValidationError::OutOfRange {
                field: "duration".to_string(),
                value: u64::from(secs),
                min: u64::from(config.custom_min_secs),
                max: u64::from(config.custom_max_secs),
            });
        }
        let step = config.custom_step_secs;
        if step > 1 && (secs - config.custom_min_secs) % step != 0 {
            return Err(ValidationError::invalid(
                "duration",
                format!(
                    "must be {} plus a multiple of {step} seconds",
                    config.custom_min_secs
                ),
            ));
        }
        Self::from_secs(secs)
    }

    pub fn secs(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for TimerDuration {
    type Error = ValidationError;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        Self::from_secs(secs)
    }
}

impl From<TimerDuration> for u32 {
    fn from(duration: TimerDuration) -> Self {
        duration.secs()
    }
}

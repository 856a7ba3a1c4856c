//! Cancellable, pausable countdown.
//!
//! A [`CountdownTimer`] owns one shared [`TimerState`]. Every `start` spawns a
//! countdown loop on the current Tokio runtime that captures the run's
//! [`RunId`]. `start` and `reset` both mint a new id, so a loop left over
//! from an earlier run notices the mismatch at its next wake-up and exits
//! without touching the state again. There is no other cancellation path.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |           |
//!           +-- reset --+--> Idle
//!           |
//!           +-- expiry --> Idle (alarm fires)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let timer = CountdownTimer::new(|| println!("\x07"));
//! let run = timer.start(TimerDuration::from_secs(30)?);
//! let mut rx = timer.subscribe();
//! while rx.changed().await.is_ok() {
//!     render(&rx.borrow());
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::state::{RunId, TimerDuration, TimerState};
use crate::events::Event;
use crate::storage::TimerConfig;

/// Side effect invoked once when a countdown expires naturally.
pub trait CompletionAlarm: Send + Sync {
    fn fire(&self);
}

impl<F> CompletionAlarm for F
where
    F: Fn() + Send + Sync,
{
    fn fire(&self) {
        self()
    }
}

/// How long the loop sleeps between checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    /// One decrement per tick while running.
    pub tick: Duration,
    /// Re-check interval while paused.
    pub paused_poll: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            paused_poll: Duration::from_millis(200),
        }
    }
}

impl From<&TimerConfig> for Cadence {
    fn from(config: &TimerConfig) -> Self {
        Self {
            tick: config.tick(),
            paused_poll: config.paused_poll(),
        }
    }
}

/// How a countdown loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopExit {
    /// Reached zero while still current; carries the completion event.
    Completed(Event),
    /// A later start or reset replaced this run.
    Superseded,
}

impl LoopExit {
    pub fn is_completed(&self) -> bool {
        matches!(self, LoopExit::Completed(_))
    }
}

/// Result of [`CountdownTimer::start`].
#[derive(Debug)]
pub struct CountdownRun {
    pub event: Event,
    pub handle: JoinHandle<LoopExit>,
}

struct Shared {
    state: Mutex<TimerState>,
    publisher: watch::Sender<TimerState>,
    alarm: Box<dyn CompletionAlarm>,
    cadence: Cadence,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish while the caller still holds the lock so observers see
    /// mutations in the order they happened.
    fn publish(&self, state: &TimerState) {
        self.publisher.send_replace(*state);
    }
}

/// Countdown state machine with an observable state.
///
/// Cheap to clone; clones drive the same countdown.
#[derive(Clone)]
pub struct CountdownTimer {
    shared: Arc<Shared>,
}

impl CountdownTimer {
    /// Create an idle timer with the default 1 s / 200 ms cadence.
    pub fn new(alarm: impl CompletionAlarm + 'static) -> Self {
        Self::with_cadence(alarm, Cadence::default())
    }

    pub fn with_cadence(alarm: impl CompletionAlarm + 'static, cadence: Cadence) -> Self {
        let initial = TimerState::idle();
        let (publisher, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(initial),
                publisher,
                alarm: Box::new(alarm),
                cadence,
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        *self.shared.lock()
    }

    pub fn progress_fraction(&self) -> f64 {
        self.state().progress_fraction()
    }

    pub fn cadence(&self) -> Cadence {
        self.shared.cadence
    }

    /// Observe every state change, including each tick.
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.shared.publisher.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh countdown, superseding any run in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, duration: TimerDuration) -> CountdownRun {
        let secs = duration.secs();
        let run_id = RunId::new();
        {
            let mut state = self.shared.lock();
            *state = TimerState {
                remaining_secs: secs,
                total_secs: secs,
                running: true,
                paused: false,
                run_id,
            };
            self.shared.publish(&state);
        }
        tracing::debug!(%run_id, secs, "countdown started");

        let handle = tokio::spawn(run_countdown(Arc::clone(&self.shared), run_id));
        CountdownRun {
            event: Event::CountdownStarted {
                run_id,
                total_secs: secs,
                at: Utc::now(),
            },
            handle,
        }
    }

    /// Toggle pause. Does nothing unless a countdown is running.
    pub fn pause_or_resume(&self) -> Option<Event> {
        let mut state = self.shared.lock();
        if !state.running {
            return None;
        }
        state.paused = !state.paused;
        self.shared.publish(&state);

        let remaining_secs = state.remaining_secs;
        Some(if state.paused {
            tracing::debug!(remaining_secs, "countdown paused");
            Event::CountdownPaused {
                remaining_secs,
                at: Utc::now(),
            }
        } else {
            tracing::debug!(remaining_secs, "countdown resumed");
            Event::CountdownResumed {
                remaining_secs,
                at: Utc::now(),
            }
        })
    }

    /// Stop everything and return to idle. Any loop in flight goes inert.
    pub fn reset(&self) -> Event {
        let mut state = self.shared.lock();
        *state = TimerState::idle();
        self.shared.publish(&state);
        tracing::debug!("countdown reset");
        Event::CountdownReset { at: Utc::now() }
    }
}

enum Step {
    Superseded,
    Expired,
    Tick,
    PausedPoll,
}

async fn run_countdown(shared: Arc<Shared>, run_id: RunId) -> LoopExit {
    let cadence = shared.cadence;
    loop {
        let step = {
            let state = shared.lock();
            if state.run_id != run_id {
                Step::Superseded
            } else if state.remaining_secs == 0 {
                Step::Expired
            } else if state.paused {
                Step::PausedPoll
            } else {
                Step::Tick
            }
        };

        match step {
            Step::Superseded => return LoopExit::Superseded,
            Step::Expired => break,
            Step::PausedPoll => {
                tokio::time::sleep(cadence.paused_poll).await;
                continue;
            }
            Step::Tick => tokio::time::sleep(cadence.tick).await,
        }

        let superseded = {
            let mut state = shared.lock();
            if state.run_id != run_id {
                true
            } else {
                // A tick that wakes up paused is dropped.
                if !state.paused {
                    state.remaining_secs = state.remaining_secs.saturating_sub(1);
                    shared.publish(&state);
                }
                false
            }
        };
        if superseded {
            return LoopExit::Superseded;
        }
    }

    let total_secs = {
        let mut state = shared.lock();
        if state.run_id != run_id || state.remaining_secs > 0 {
            return LoopExit::Superseded;
        }
        state.running = false;
        state.paused = false;
        shared.publish(&state);
        state.total_secs
    };

    tracing::info!(%run_id, total_secs, "countdown completed");
    shared.alarm.fire();
    LoopExit::Completed(Event::CountdownCompleted {
        run_id,
        total_secs,
        at: Utc::now(),
    })
}

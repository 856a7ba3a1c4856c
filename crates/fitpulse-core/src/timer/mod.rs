mod countdown;
mod state;

pub use countdown::{Cadence, CompletionAlarm, CountdownRun, CountdownTimer, LoopExit};
pub use state::{RunId, TimerDuration, TimerState};

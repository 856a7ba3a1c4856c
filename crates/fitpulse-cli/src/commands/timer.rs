use clap::Subcommand;
use fitpulse_core::storage::TimerConfig;
use fitpulse_core::timer::{Cadence, LoopExit, TimerState};
use fitpulse_core::{Config, CountdownTimer, TimerDuration};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::print_json;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a countdown in the foreground (type `p` + Enter to pause/resume, `r` to reset)
    Run {
        /// Duration in seconds
        #[arg(required_unless_present = "preset", conflicts_with = "preset")]
        seconds: Option<u32>,
        /// Use a configured preset instead (0-based index)
        #[arg(long)]
        preset: Option<usize>,
        /// Accept any positive duration, ignoring the configured custom range
        #[arg(long)]
        any: bool,
        /// Don't print a progress line per tick
        #[arg(long)]
        quiet: bool,
    },
    /// List the configured preset durations
    Presets,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        TimerAction::Presets => print_json(&config.timer.presets)?,
        TimerAction::Run {
            seconds,
            preset,
            any,
            quiet,
        } => {
            let duration = match (seconds, preset) {
                (_, Some(index)) => TimerDuration::preset(index, &config.timer)?,
                (Some(secs), None) if any => TimerDuration::from_secs(secs)?,
                (Some(secs), None) => TimerDuration::custom(secs, &config.timer)?,
                (None, None) => return Err("give a duration in seconds or --preset".into()),
            };

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(countdown(duration, &config.timer, quiet));
            // Don't wait on the blocking stdin reader.
            runtime.shutdown_background();
            result?;
        }
    }
    Ok(())
}

async fn countdown(
    duration: TimerDuration,
    config: &TimerConfig,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ring = config.alarm;
    let timer = CountdownTimer::with_cadence(
        move || {
            if ring {
                eprint!("\x07");
            }
        },
        Cadence::from(config),
    );

    let mut rx = timer.subscribe();
    let run = timer.start(duration);
    print_json(&run.event)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *rx.borrow_and_update();
                if !quiet {
                    render(&state);
                }
                if !state.running {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(input) => match input.trim() {
                        "p" | "pause" | "resume" => {
                            if let Some(event) = timer.pause_or_resume() {
                                print_json(&event)?;
                            }
                        }
                        "r" | "reset" => print_json(&timer.reset())?,
                        "" => {}
                        other => eprintln!("unknown input '{other}': p = pause/resume, r = reset"),
                    },
                    None => {
                        tracing::debug!("stdin closed, countdown continues unattended");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    if let LoopExit::Completed(event) = run.handle.await? {
        print_json(&event)?;
    }
    Ok(())
}

fn render(state: &TimerState) {
    let status = if !state.running {
        "stopped"
    } else if state.paused {
        "paused"
    } else {
        "running"
    };
    eprintln!(
        "{:>4} sec  [{:>3.0}%]  {status}",
        state.remaining_secs,
        state.progress_fraction() * 100.0
    );
}

use clap::Subcommand;
use focusjar_core::{Config, Event, TimerState};

use super::{format_mmss, open_app, print_json, App};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session on the first planned task
    Start {
        /// Stay attached and tick until the session ends
        #[arg(long)]
        watch: bool,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Abandon the session; the task stays planned
    Cancel,
    /// Print current timer state as JSON
    Status,
    /// Tick the running session until it ends
    Watch,
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app(config)?;

    match action {
        TimerAction::Start { watch } => {
            let event = match app.start() {
                Some(event) => event,
                None if app.state() != TimerState::Idle => {
                    return Err("a session is already in progress".into())
                }
                None => return Err("no planned task to start".into()),
            };
            print_json(&event)?;
            if watch {
                watch_session(&mut app)?;
            }
        }
        TimerAction::Pause => {
            let event = app.pause().ok_or("no running session")?;
            print_json(&event)?;
        }
        TimerAction::Resume => {
            let event = app.resume().ok_or("no paused session")?;
            print_json(&event)?;
        }
        TimerAction::Cancel => {
            let event = app.cancel().ok_or("no session to cancel")?;
            print_json(&event)?;
        }
        TimerAction::Status => print_json(&app.snapshot())?,
        TimerAction::Watch => {
            if app.state() != TimerState::Running {
                return Err("no running session".into());
            }
            watch_session(&mut app)?;
        }
    }
    Ok(())
}

/// Drive the tick from this process, redrawing the countdown on stderr.
fn watch_session(app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let finished = runtime.block_on(app.drive(|app, _| {
        eprint!("\r{} ", format_mmss(app.engine().remaining_secs()));
    }));
    eprintln!();

    if let Some(event @ Event::SessionCompleted { .. }) = finished {
        print_json(&event)?;
    }
    Ok(())
}

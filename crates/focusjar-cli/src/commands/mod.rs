pub mod advise;
pub mod config;
pub mod goal;
pub mod history;
pub mod jar;
pub mod plan;
pub mod plant;
pub mod sync;
pub mod timer;

use focusjar_core::error::Result;
use focusjar_core::storage::Database;
use focusjar_core::{Config, Event, Orchestrator, SystemClock};

pub type App = Orchestrator<Database, SystemClock>;

/// Open the on-disk store and rehydrate. Anything that happened while the
/// app was closed is reported on stderr.
pub fn open_app(config: &Config) -> Result<App> {
    let db = Database::open()?;
    let app = Orchestrator::open(db, SystemClock, &config.session);
    tracing::debug!(state = ?app.state(), planned = app.planned().len(), "store opened");
    for event in app.startup_events() {
        report_startup(event);
    }
    Ok(app)
}

fn report_startup(event: &Event) {
    match event {
        Event::SessionCompleted { task, .. } => {
            eprintln!("session \"{}\" finished while closed; moved to the jar", task.text);
        }
        Event::SessionRestored {
            task,
            state,
            remaining_secs,
            ..
        } => {
            eprintln!(
                "restored {:?} session \"{}\" ({} left)",
                state,
                task.text,
                format_mmss(*remaining_secs)
            );
        }
        Event::WeekRolledOver { from, to, archived, .. } => match archived {
            Some(record) => eprintln!(
                "new week {to}; archived {} tasks from week of {from}",
                record.completed_count
            ),
            None => eprintln!("new week {to}"),
        },
        _ => {}
    }
}

pub fn format_mmss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

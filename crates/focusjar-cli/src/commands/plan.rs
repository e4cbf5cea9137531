use clap::Subcommand;
use focusjar_core::{Config, PlanEntry};

use super::{open_app, print_json};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Add a task to the end of the plan
    Add {
        /// Task text
        text: String,
    },
    /// Remove a planned task
    Remove {
        /// Task ID
        id: i64,
    },
    /// Replace the whole plan, in order
    Replace {
        /// Task texts, first is worked on next
        texts: Vec<String>,
    },
    /// List planned tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: PlanAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app(config)?;

    match action {
        PlanAction::Add { text } => match app.add_planned(&text) {
            Some(task) => print_json(&task)?,
            None => return Err("task text is empty".into()),
        },
        PlanAction::Remove { id } => match app.remove_planned(id) {
            Some(task) => print_json(&task)?,
            None => return Err(format!("no planned task with id {id}").into()),
        },
        PlanAction::Replace { texts } => {
            let entries = texts
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| PlanEntry::from(t.trim()))
                .collect();
            app.replace_plan(entries);
            print_json(app.planned())?;
        }
        PlanAction::List { json } => {
            if json {
                print_json(app.planned())?;
            } else if app.planned().is_empty() {
                println!("No planned tasks.");
            } else {
                for (i, task) in app.planned().iter().enumerate() {
                    let marker = if i == 0 { ">" } else { " " };
                    println!("{marker} [{}] {:<8} {}", task.id, task.kind.label(), task.text);
                }
            }
        }
    }
    Ok(())
}

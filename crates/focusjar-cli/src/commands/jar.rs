use clap::Subcommand;
use focusjar_core::{Config, TaskKind};
use serde::Serialize;

use super::{open_app, print_json};

#[derive(Subcommand)]
pub enum JarAction {
    /// Show completed tasks and the reward balance
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sell the oldest completed task for one unit
    Sell,
}

#[derive(Serialize)]
struct JarView<'a> {
    completed: &'a [focusjar_core::Task],
    consume: usize,
    produce: usize,
    balance: u64,
}

pub fn run(action: JarAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app(config)?;

    match action {
        JarAction::List { json } => {
            let consume = app.completed_count(TaskKind::Consume);
            let produce = app.completed_count(TaskKind::Produce);
            if json {
                print_json(&JarView {
                    completed: app.completed(),
                    consume,
                    produce,
                    balance: app.balance(),
                })?;
            } else {
                println!("Balance: {}", app.balance());
                println!("Completed this week: {}", app.completed().len());
                println!("  Consume: {consume}  Produce: {produce}");
                for task in app.completed() {
                    println!("  [{}] {:<8} {}", task.id, task.kind.label(), task.text);
                }
            }
        }
        JarAction::Sell => {
            let event = app.sell_one().ok_or("the jar is empty")?;
            print_json(&event)?;
        }
    }
    Ok(())
}

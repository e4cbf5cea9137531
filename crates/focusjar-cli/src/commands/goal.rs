use clap::Subcommand;
use focusjar_core::Config;

use super::open_app;

#[derive(Subcommand)]
pub enum GoalAction {
    /// Print the main goal
    Show,
    /// Set the main goal
    Set {
        /// Goal text
        text: String,
    },
    /// Clear the main goal
    Clear,
}

pub fn run(action: GoalAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app(config)?;

    match action {
        GoalAction::Show => println!("{}", app.main_task()),
        GoalAction::Set { text } => {
            app.set_main_task(text.trim());
            println!("ok");
        }
        GoalAction::Clear => {
            app.set_main_task("");
            println!("ok");
        }
    }
    Ok(())
}

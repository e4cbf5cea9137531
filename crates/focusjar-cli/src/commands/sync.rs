use clap::Subcommand;
use focusjar_core::{Config, SyncPayload};

use super::{open_app, print_json};

#[derive(Subcommand)]
pub enum SyncAction {
    /// Print the main goal and both task lists as JSON
    Export {
        /// Print the base64 text code instead
        #[arg(long)]
        code: bool,
    },
    /// Replace local goal and task lists with a sync code
    Import {
        /// Sync code or raw JSON
        code: String,
        /// Confirm overwriting local data
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: SyncAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app(config)?;

    match action {
        SyncAction::Export { code } => {
            let payload = app.export_sync();
            if code {
                println!("{}", payload.encode());
            } else {
                println!("{}", payload.to_json());
            }
        }
        SyncAction::Import { code, yes } => {
            let payload = SyncPayload::decode(&code)?;
            let event = app.import_sync(payload, yes)?;
            print_json(&event)?;
        }
    }
    Ok(())
}

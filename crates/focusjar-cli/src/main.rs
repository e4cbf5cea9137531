use clap::{Parser, Subcommand};
use focusjar_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusjar", version, about = "Focus Jar CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Planned task management
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Completed tasks and reward balance
    Jar {
        #[command(subcommand)]
        action: commands::jar::JarAction,
    },
    /// Main goal
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Archived weekly counts
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// This week's plant
    Plant {
        /// Any date inside the week to show (YYYY-MM-DD)
        #[arg(long)]
        week: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move goal and tasks between devices
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Ask the advisor whether a task serves the main goal
    Advise {
        /// Task text
        text: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let (config, load_error) = match Config::try_load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    if let Some(e) = load_error {
        tracing::warn!(error = %e, "invalid config, using defaults");
    }

    let result = match cli.command {
        Commands::Plan { action } => commands::plan::run(action, &config),
        Commands::Timer { action } => commands::timer::run(action, &config),
        Commands::Jar { action } => commands::jar::run(action, &config),
        Commands::Goal { action } => commands::goal::run(action, &config),
        Commands::History { json } => commands::history::run(json, &config),
        Commands::Plant { week, json } => commands::plant::run(week, json, &config),
        Commands::Sync { action } => commands::sync::run(action, &config),
        Commands::Advise { text } => commands::advise::run(text, &config),
        Commands::Config { action } => commands::config::run(action, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

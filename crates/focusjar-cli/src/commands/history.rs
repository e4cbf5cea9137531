use focusjar_core::Config;

use super::{open_app, print_json};

/// Print archived weeks, newest first.
pub fn run(json: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app(config)?;
    let mut history = app.history().to_vec();
    history.sort_by(|a, b| b.week_start.cmp(&a.week_start));

    if json {
        print_json(&history)?;
    } else if history.is_empty() {
        println!("No archived weeks yet.");
    } else {
        for record in &history {
            println!("Week of {}  {}", record.week_start, record.completed_count);
        }
    }
    Ok(())
}

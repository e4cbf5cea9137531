use focusjar_core::{AdvisorClient, AdvisorRequest, Config, TaskKind};

use super::{open_app, print_json};

/// Ask the advisory service whether `text` serves the main goal. The answer
/// is printed and nothing is changed.
pub fn run(text: String, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app(config)?;
    let request = AdvisorRequest {
        high_priority_task: app.main_task().to_string(),
        current_task_text: text.trim().to_string(),
        task_type: TaskKind::for_index(app.planned().len()),
    };
    if request.current_task_text.is_empty() {
        return Err("task text is empty".into());
    }

    let client = AdvisorClient::new(&config.advisor)?;
    if !client.is_enabled() {
        eprintln!("advisor endpoint not configured; set advisor.endpoint");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let response = runtime.block_on(client.analyze(&request))?;
    print_json(&response)?;
    Ok(())
}

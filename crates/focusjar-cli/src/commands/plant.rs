use focusjar_core::rollover::{self, week_id};
use focusjar_core::shapes::PlantShape;
use focusjar_core::{generate_shape_indices, Config, PlantStyle};

use super::{open_app, print_json};

/// Show this week's plant, or the plant for the week containing `date`.
pub fn run(date: Option<String>, json: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let week = match date {
        Some(raw) => {
            let parsed = rollover::parse_week_id(&raw)
                .ok_or_else(|| format!("expected a date as YYYY-MM-DD, got '{raw}'"))?;
            rollover::week_start(parsed)
        }
        None => open_app(config)?.current_week(),
    };
    let indices = generate_shape_indices(&week_id(week));

    if json {
        print_json(&serde_json::json!({
            "week": week_id(week),
            "leaf": indices.leaf,
            "flower": indices.flower,
        }))?;
        return Ok(());
    }

    let style = PlantStyle::from(indices);
    println!("Week of {week}: leaf #{} flower #{}", indices.leaf, indices.flower);
    println!();
    print_shape(style.flower_shape);
    println!();
    print_shape(style.leaf_shape);
    Ok(())
}

fn print_shape(shape: PlantShape) {
    for row in shape {
        let line: String = row
            .iter()
            .map(|&px| if px == 1 { '#' } else { ' ' })
            .collect();
        println!("  {}", line.trim_end());
    }
}

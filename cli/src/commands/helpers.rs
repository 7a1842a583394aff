use std::process;

use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use frond_core::catalog::find_plant;
use frond_core::models::Plant;
use frond_core::schedule::ScheduleView;

/// Look up a plant by name or exit 2 with a "not found" message, matching
/// the convention that empty results are exit code 2, not errors.
pub(crate) fn require_plant<'a>(plants: &'a [Plant], name: &str, json: bool) -> &'a Plant {
    match find_plant(plants, name) {
        Some(plant) => plant,
        None => {
            let message = format!("No plant named '{name}' in the catalog");
            if json {
                println!("{}", json_error(&message));
            } else {
                eprintln!("{message}");
            }
            process::exit(2);
        }
    }
}

pub(crate) fn print_schedule_table(views: &[ScheduleView]) {
    #[derive(Tabled)]
    struct ScheduleRow {
        #[tabled(rename = "Plant")]
        plant: String,
        #[tabled(rename = "Interval")]
        interval: String,
        #[tabled(rename = "Last watered")]
        last_watered: String,
        #[tabled(rename = "Next due")]
        next_due: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<ScheduleRow> = views
        .iter()
        .map(|v| ScheduleRow {
            plant: truncate(&v.plant_name, 30),
            interval: format!("{}d", v.interval_days),
            last_watered: v.last_watered_display.clone(),
            next_due: v.next_due_display.clone(),
            status: v.status_label.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// One warning per distinct load-error message, after the data output.
pub(crate) fn warn_load_errors(views: &[ScheduleView]) {
    let mut seen: Vec<&str> = Vec::new();
    for view in views {
        if let Some(message) = view.load_error.as_deref() {
            if !seen.contains(&message) {
                seen.push(message);
                eprintln!("Warning: {message}");
            }
        }
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

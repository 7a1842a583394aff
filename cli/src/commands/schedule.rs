use anyhow::Result;
use chrono::Utc;

use frond_core::models::Plant;
use frond_core::schedule::{SNOOZE_DAYS, ScheduleView};
use frond_core::service::{ScheduleService, WateringStore};

use super::helpers::{print_schedule_table, require_plant, warn_load_errors};

pub(crate) async fn cmd_status<S: WateringStore>(
    plants: &[Plant],
    service: &ScheduleService<S>,
    plant: Option<&str>,
    json: bool,
) -> Result<()> {
    let now = Utc::now();

    let views: Vec<ScheduleView> = match plant {
        Some(name) => {
            let plant = require_plant(plants, name, json);
            let state = service.load(&plant.name, &plant.category).await;
            vec![ScheduleView::build(&state, &plant.notes, now)]
        }
        None => {
            let states = service.load_all(plants).await;
            plants
                .iter()
                .zip(&states)
                .map(|(p, state)| ScheduleView::build(state, &p.notes, now))
                .collect()
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        eprintln!("No plants in the catalog");
        std::process::exit(2);
    }

    if !service.available() {
        eprintln!("Note: watering store not configured; showing category defaults");
    }

    print_schedule_table(&views);
    warn_load_errors(&views);

    Ok(())
}

pub(crate) async fn cmd_water<S: WateringStore>(
    plants: &[Plant],
    service: &ScheduleService<S>,
    name: &str,
    json: bool,
) -> Result<()> {
    let plant = require_plant(plants, name, json);
    let state = service.load(&plant.name, &plant.category).await;
    let updated = service.mark_watered(&state).await?;
    let view = ScheduleView::build(&updated, &plant.notes, Utc::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!(
            "Watered {} — next due {}",
            plant.name, view.next_due_display
        );
    }

    Ok(())
}

pub(crate) async fn cmd_snooze<S: WateringStore>(
    plants: &[Plant],
    service: &ScheduleService<S>,
    name: &str,
    json: bool,
) -> Result<()> {
    let plant = require_plant(plants, name, json);
    let state = service.load(&plant.name, &plant.category).await;
    let updated = service.snooze(&state).await?;
    let view = ScheduleView::build(&updated, &plant.notes, Utc::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!(
            "Snoozed {} for {SNOOZE_DAYS} days — next due {}",
            plant.name, view.next_due_display
        );
    }

    Ok(())
}

pub(crate) async fn cmd_interval<S: WateringStore>(
    plants: &[Plant],
    service: &ScheduleService<S>,
    name: &str,
    days: i64,
    json: bool,
) -> Result<()> {
    let plant = require_plant(plants, name, json);
    let state = service.load(&plant.name, &plant.category).await;
    let updated = service.set_interval(&state, days).await?;
    let view = ScheduleView::build(&updated, &plant.notes, Utc::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!(
            "Set interval for {} to {days} days — next due {}",
            plant.name, view.next_due_display
        );
    }

    Ok(())
}

use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use glucolog_core::service::TrackerService;

use super::helpers::truncate;

pub(crate) fn cmd_stats(
    svc: &TrackerService,
    owner: i64,
    exercise: Option<String>,
    json: bool,
) -> Result<()> {
    if let Some(name) = exercise {
        let exercise = svc.get_exercise_by_name(owner, &name)?;
        let stats = svc.exercise_stats(owner, exercise.id)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else if stats.completed_entries == 0 {
            println!("{}: no completed entries yet", stats.exercise_name);
        } else {
            println!(
                "{}: {:+.2} mmol/L average change over {} completed {}",
                stats.exercise_name,
                stats.average_change,
                stats.completed_entries,
                if stats.completed_entries == 1 {
                    "entry"
                } else {
                    "entries"
                }
            );
        }
        return Ok(());
    }

    let stats = svc.all_exercise_stats(owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else if stats.is_empty() {
        eprintln!("No exercises yet. Use `glucolog exercise add` to create one.");
    } else {
        #[derive(Tabled)]
        struct StatsRow {
            #[tabled(rename = "Exercise")]
            name: String,
            #[tabled(rename = "Intensity")]
            intensity: String,
            #[tabled(rename = "Avg change")]
            average: String,
            #[tabled(rename = "Completed")]
            completed: i64,
        }

        let rows: Vec<StatsRow> = stats
            .iter()
            .map(|s| StatsRow {
                name: truncate(&s.exercise_name, 30),
                intensity: s.intensity.clone(),
                // A zero average with zero entries is "no data", not 0.0
                average: if s.completed_entries == 0 {
                    "-".to_string()
                } else {
                    format!("{:+.2}", s.average_change)
                },
                completed: s.completed_entries,
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }
    Ok(())
}

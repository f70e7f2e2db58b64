use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use glucolog_core::models::{Entry, NewEntry, UpdateEntry};
use glucolog_core::service::TrackerService;

use super::helpers::{fmt_change, fmt_mmol, truncate};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_entry_add(
    svc: &TrackerService,
    owner: i64,
    exercise: &str,
    before: Option<i64>,
    after: Option<i64>,
    duration: Option<i64>,
    notes: Option<String>,
    sugar: Option<f64>,
    json: bool,
) -> Result<()> {
    let exercise = svc.get_exercise_by_name(owner, exercise)?;
    let entry = svc.create_entry(
        owner,
        &NewEntry {
            exercise_id: exercise.id,
            before_reading_id: before,
            after_reading_id: after,
            duration_minutes: duration,
            notes: notes.unwrap_or_default(),
            sugar_grams: sugar,
        },
    )?;

    print_entry(&entry, json)
}

#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
pub(crate) fn cmd_entry_update(
    svc: &TrackerService,
    owner: i64,
    id: i64,
    exercise: Option<String>,
    before: Option<i64>,
    clear_before: bool,
    after: Option<i64>,
    clear_after: bool,
    duration: Option<i64>,
    clear_duration: bool,
    notes: Option<String>,
    sugar: Option<f64>,
    json: bool,
) -> Result<()> {
    if before.is_some() && clear_before {
        bail!("--before and --clear-before are mutually exclusive");
    }
    if after.is_some() && clear_after {
        bail!("--after and --clear-after are mutually exclusive");
    }
    if duration.is_some() && clear_duration {
        bail!("--duration and --clear-duration are mutually exclusive");
    }

    let exercise_id = match exercise {
        Some(name) => Some(svc.get_exercise_by_name(owner, &name)?.id),
        None => None,
    };

    let merge = |set: Option<i64>, clear: bool| {
        if clear {
            Some(None)
        } else {
            set.map(Some)
        }
    };

    let update = UpdateEntry {
        exercise_id,
        before_reading_id: merge(before, clear_before),
        after_reading_id: merge(after, clear_after),
        duration_minutes: merge(duration, clear_duration),
        notes,
        sugar_grams: sugar,
    };

    let entry = svc.update_entry(owner, id, &update)?;
    print_entry(&entry, json)
}

pub(crate) fn cmd_entry_show(svc: &TrackerService, owner: i64, id: i64, json: bool) -> Result<()> {
    let entry = svc.get_entry(owner, id)?;
    print_entry(&entry, json)
}

pub(crate) fn cmd_entry_list(
    svc: &TrackerService,
    owner: i64,
    exercise: Option<String>,
    json: bool,
) -> Result<()> {
    let exercise_id = match exercise {
        Some(name) => Some(svc.get_exercise_by_name(owner, &name)?.id),
        None => None,
    };
    let entries = svc.list_entries(owner, exercise_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No entries yet. Use `glucolog entry add` or `glucolog session` to log one.");
    } else {
        #[derive(Tabled)]
        struct EntryRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Exercise")]
            exercise: String,
            #[tabled(rename = "Before")]
            before: String,
            #[tabled(rename = "After")]
            after: String,
            #[tabled(rename = "Change")]
            change: String,
            #[tabled(rename = "Min")]
            minutes: String,
            #[tabled(rename = "Sugar g")]
            sugar: String,
            #[tabled(rename = "Done")]
            done: String,
        }

        let rows: Vec<EntryRow> = entries
            .iter()
            .map(|e| EntryRow {
                id: e.id,
                date: e.date.clone(),
                exercise: truncate(e.exercise_name.as_deref().unwrap_or(""), 25),
                before: fmt_mmol(e.before_value),
                after: fmt_mmol(e.after_value),
                change: fmt_change(e.blood_sugar_diff),
                minutes: e.duration_minutes.map_or("-".into(), |m| m.to_string()),
                sugar: format!("{:.1}", e.sugar_grams),
                done: if e.completed { "yes" } else { "no" }.to_string(),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..8)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }
    Ok(())
}

pub(crate) fn cmd_entry_delete(
    svc: &TrackerService,
    owner: i64,
    id: i64,
    json: bool,
) -> Result<()> {
    if !svc.delete_entry(owner, id)? {
        bail!("Entry {id} not found");
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted entry {id}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_session(
    svc: &TrackerService,
    owner: i64,
    exercise: &str,
    before: f64,
    after: f64,
    duration: Option<i64>,
    notes: Option<String>,
    sugar: Option<f64>,
    json: bool,
) -> Result<()> {
    let exercise = svc.get_exercise_by_name(owner, exercise)?;
    let entry = svc.record_session(
        owner,
        exercise.id,
        before,
        after,
        duration,
        notes.as_deref().unwrap_or(""),
        sugar,
    )?;

    print_entry(&entry, json)
}

fn print_entry(entry: &Entry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }

    let status = if entry.completed {
        "completed"
    } else {
        "in progress"
    };
    println!(
        "Entry {}: {} on {} ({status})",
        entry.id,
        entry.exercise_name.as_deref().unwrap_or(""),
        entry.date
    );
    println!(
        "  Blood sugar: {} -> {} mmol/L (change {})",
        fmt_mmol(entry.before_value),
        fmt_mmol(entry.after_value),
        fmt_change(entry.blood_sugar_diff)
    );
    if let Some(minutes) = entry.duration_minutes {
        println!("  Duration: {minutes} min");
    }
    if entry.sugar_grams > 0.0 {
        println!("  Sugar: {:.1} g", entry.sugar_grams);
    }
    if !entry.notes.is_empty() {
        println!("  Notes: {}", entry.notes);
    }
    Ok(())
}

use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use glucolog_core::models::{NewExercise, UpdateExercise};
use glucolog_core::service::TrackerService;

use super::helpers::truncate;

pub(crate) fn cmd_exercise_add(
    svc: &TrackerService,
    owner: i64,
    name: &str,
    description: Option<String>,
    intensity: &str,
    json: bool,
) -> Result<()> {
    let exercise = svc.create_exercise(
        owner,
        &NewExercise {
            name: name.to_string(),
            description: description.unwrap_or_default(),
            intensity: intensity.to_string(),
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exercise)?);
    } else {
        println!(
            "Added exercise '{}' ({} intensity)",
            exercise.name, exercise.intensity
        );
    }
    Ok(())
}

pub(crate) fn cmd_exercise_list(svc: &TrackerService, owner: i64, json: bool) -> Result<()> {
    let exercises = svc.list_exercises(owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exercises)?);
    } else if exercises.is_empty() {
        eprintln!("No exercises yet. Use `glucolog exercise add` to create one.");
    } else {
        #[derive(Tabled)]
        struct ExerciseRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Intensity")]
            intensity: String,
            #[tabled(rename = "Description")]
            description: String,
        }

        let rows: Vec<ExerciseRow> = exercises
            .iter()
            .map(|x| ExerciseRow {
                id: x.id,
                name: truncate(&x.name, 30),
                intensity: x.intensity.clone(),
                description: truncate(&x.description, 40),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(0..1)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }
    Ok(())
}

pub(crate) fn cmd_exercise_edit(
    svc: &TrackerService,
    owner: i64,
    name: &str,
    new_name: Option<String>,
    description: Option<String>,
    intensity: Option<String>,
    json: bool,
) -> Result<()> {
    let exercise = svc.get_exercise_by_name(owner, name)?;
    let updated = svc.update_exercise(
        owner,
        exercise.id,
        &UpdateExercise {
            name: new_name,
            description,
            intensity,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!(
            "Updated exercise '{}' ({} intensity)",
            updated.name, updated.intensity
        );
    }
    Ok(())
}

pub(crate) fn cmd_exercise_delete(
    svc: &TrackerService,
    owner: i64,
    name: &str,
    json: bool,
) -> Result<()> {
    let exercise = svc.get_exercise_by_name(owner, name)?;
    svc.delete_exercise(owner, exercise.id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": exercise.id }));
    } else {
        println!("Deleted exercise '{}' and its entries", exercise.name);
    }
    Ok(())
}

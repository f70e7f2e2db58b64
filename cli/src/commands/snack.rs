use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use glucolog_core::models::{NewSnack, UpdateSnack};
use glucolog_core::service::TrackerService;

use super::helpers::truncate;

pub(crate) fn cmd_snack_add(
    svc: &TrackerService,
    owner: i64,
    name: &str,
    description: Option<String>,
    sugar: Option<f64>,
    json: bool,
) -> Result<()> {
    let snack = svc.create_snack(
        owner,
        &NewSnack {
            name: name.to_string(),
            description: description.unwrap_or_default(),
            sugar_grams: sugar,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snack)?);
    } else {
        println!("Added snack '{}' ({:.1} g sugar)", snack.name, snack.sugar_grams);
    }
    Ok(())
}

pub(crate) fn cmd_snack_list(svc: &TrackerService, owner: i64, json: bool) -> Result<()> {
    let snacks = svc.list_snacks(owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snacks)?);
    } else if snacks.is_empty() {
        eprintln!("No snacks yet. Use `glucolog snack add` to create one.");
    } else {
        #[derive(Tabled)]
        struct SnackRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Sugar g")]
            sugar: String,
            #[tabled(rename = "Description")]
            description: String,
        }

        let rows: Vec<SnackRow> = snacks
            .iter()
            .map(|s| SnackRow {
                id: s.id,
                name: truncate(&s.name, 30),
                sugar: format!("{:.1}", s.sugar_grams),
                description: truncate(&s.description, 40),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }
    Ok(())
}

pub(crate) fn cmd_snack_edit(
    svc: &TrackerService,
    owner: i64,
    id: i64,
    name: Option<String>,
    description: Option<String>,
    sugar: Option<f64>,
    json: bool,
) -> Result<()> {
    let snack = svc.update_snack(
        owner,
        id,
        &UpdateSnack {
            name,
            description,
            sugar_grams: sugar,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snack)?);
    } else {
        println!(
            "Updated snack '{}' ({:.1} g sugar)",
            snack.name, snack.sugar_grams
        );
    }
    Ok(())
}

pub(crate) fn cmd_snack_delete(
    svc: &TrackerService,
    owner: i64,
    id: i64,
    json: bool,
) -> Result<()> {
    if !svc.delete_snack(owner, id)? {
        anyhow::bail!("Snack {id} not found");
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted snack {id}");
    }
    Ok(())
}

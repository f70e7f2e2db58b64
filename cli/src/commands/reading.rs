use anyhow::Result;
use chrono::DateTime;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use glucolog_core::service::TrackerService;

pub(crate) fn cmd_reading_add(
    svc: &TrackerService,
    owner: i64,
    value: f64,
    reading_type: &str,
    json: bool,
) -> Result<()> {
    let reading = svc.log_reading(owner, value, reading_type)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
    } else {
        println!(
            "Logged {} reading #{}: {:.1} mmol/L",
            reading.reading_type, reading.id, reading.value
        );
    }
    Ok(())
}

pub(crate) fn cmd_reading_list(
    svc: &TrackerService,
    owner: i64,
    reading_type: Option<&str>,
    json: bool,
) -> Result<()> {
    let readings = svc.list_readings(owner, reading_type)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    } else if readings.is_empty() {
        eprintln!("No readings yet. Use `glucolog reading add` to log one.");
    } else {
        #[derive(Tabled)]
        struct ReadingRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Type")]
            reading_type: String,
            #[tabled(rename = "mmol/L")]
            value: String,
            #[tabled(rename = "Taken")]
            taken: String,
        }

        let rows: Vec<ReadingRow> = readings
            .iter()
            .map(|r| ReadingRow {
                id: r.id,
                reading_type: r.reading_type.clone(),
                value: format!("{:.1}", r.value),
                taken: DateTime::parse_from_rfc3339(&r.created_at).map_or_else(
                    |_| r.created_at.clone(),
                    |t| t.format("%Y-%m-%d %H:%M").to_string(),
                ),
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

pub(crate) fn cmd_reading_delete(
    svc: &TrackerService,
    owner: i64,
    id: i64,
    json: bool,
) -> Result<()> {
    svc.delete_reading(owner, id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted reading {id}. Any entry that referenced it now has that slot empty.");
    }
    Ok(())
}

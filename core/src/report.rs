use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};

use crate::db::Database;
use crate::models::Exercise;

/// Header row of the clinician report.
pub const REPORT_HEADERS: &[&str] = &[
    "date",
    "exercise",
    "intensity",
    "before_mmol",
    "after_mmol",
    "change_mmol",
    "duration_min",
    "sugar_g",
    "notes",
];

/// Build a CSV report of an owner's entries, newest first, suitable for
/// sharing with a clinician. Blood sugar columns are blank when the
/// entry has no value for them; a blank change means "not computable",
/// which is different from a change of 0.0.
pub fn build_clinician_report(db: &Database, owner: i64) -> Result<String> {
    let exercises: HashMap<i64, Exercise> = db
        .list_exercises(owner)?
        .into_iter()
        .map(|x| (x.id, x))
        .collect();
    let entries = db.list_entries(owner, None)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADERS)?;

    for entry in &entries {
        let intensity = exercises
            .get(&entry.exercise_id)
            .map(|x| x.intensity.clone())
            .unwrap_or_default();
        let fmt_mmol = |v: Option<f64>| v.map(|v| format!("{v:.1}")).unwrap_or_default();
        writer.write_record(&[
            entry.date.clone(),
            entry.exercise_name.clone().unwrap_or_default(),
            intensity,
            fmt_mmol(entry.before_value),
            fmt_mmol(entry.after_value),
            entry
                .blood_sugar_diff
                .map(|d| format!("{d:+.1}"))
                .unwrap_or_default(),
            entry
                .duration_minutes
                .map(|m| m.to_string())
                .unwrap_or_default(),
            format!("{:.2}", entry.sugar_grams),
            entry.notes.clone(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("failed to flush CSV report: {e}"))?;
    String::from_utf8(bytes).context("CSV report is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewEntry, NewExercise, NewReading};

    fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("alice", "alice-key").unwrap().id;
        let exercise = db
            .insert_exercise(
                owner,
                &NewExercise {
                    name: "Running".to_string(),
                    description: String::new(),
                    intensity: "high".to_string(),
                },
            )
            .unwrap();
        (db, owner, exercise.id)
    }

    fn log_session(db: &Database, owner: i64, exercise_id: i64, before: f64, after: f64) {
        let b = db
            .insert_reading(
                owner,
                &NewReading {
                    value: before,
                    reading_type: "before".to_string(),
                },
            )
            .unwrap();
        let a = db
            .insert_reading(
                owner,
                &NewReading {
                    value: after,
                    reading_type: "after".to_string(),
                },
            )
            .unwrap();
        db.insert_entry(
            owner,
            &NewEntry {
                exercise_id,
                before_reading_id: Some(b.id),
                after_reading_id: Some(a.id),
                duration_minutes: Some(30),
                notes: "steady".to_string(),
                sugar_grams: Some(10.0),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_empty_report_is_header_only() {
        let (db, owner, _) = setup();
        let report = build_clinician_report(&db, owner).unwrap();
        let mut lines = report.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,exercise,intensity,before_mmol,after_mmol,change_mmol,duration_min,sugar_g,notes"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_report_rows_roundtrip_through_csv() {
        let (db, owner, exercise_id) = setup();
        log_session(&db, owner, exercise_id, 5.0, 7.2);

        let report = build_clinician_report(&db, owner).unwrap();
        let mut reader = csv::Reader::from_reader(report.as_bytes());
        let records: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);

        let row = &records[0];
        assert_eq!(&row[1], "Running");
        assert_eq!(&row[2], "high");
        assert_eq!(&row[3], "5.0");
        assert_eq!(&row[4], "7.2");
        assert_eq!(&row[5], "+2.2");
        assert_eq!(&row[6], "30");
        assert_eq!(&row[7], "10.00");
        assert_eq!(&row[8], "steady");
    }

    #[test]
    fn test_report_blank_columns_for_incomplete_entry() {
        let (db, owner, exercise_id) = setup();
        db.insert_entry(
            owner,
            &NewEntry {
                exercise_id,
                ..NewEntry::default()
            },
        )
        .unwrap();

        let report = build_clinician_report(&db, owner).unwrap();
        let mut reader = csv::Reader::from_reader(report.as_bytes());
        let records: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][3], "");
        assert_eq!(&records[0][4], "");
        assert_eq!(&records[0][5], "");
        assert_eq!(&records[0][6], "");
    }

    #[test]
    fn test_report_scoped_to_owner() {
        let (db, owner, exercise_id) = setup();
        log_session(&db, owner, exercise_id, 5.0, 7.2);
        let bob = db.create_user("bob", "bob-key").unwrap().id;

        let report = build_clinician_report(&db, bob).unwrap();
        assert_eq!(report.lines().count(), 1); // header only
    }
}

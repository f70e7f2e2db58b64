use std::path::Path;

use anyhow::Result;

use crate::db::Database;
use crate::models::{
    Entry, Exercise, ExerciseStats, NewEntry, NewExercise, NewReading, NewSnack, Reading,
    READING_AFTER, READING_BEFORE, Snack, UpdateEntry, UpdateExercise, UpdateSnack, User,
    validate_duration, validate_reading_value, validate_sugar_grams,
};
use crate::report;

/// Embedding-friendly façade over the database layer.
///
/// Every operation takes the owner explicitly; there is no ambient
/// "current user".
pub struct TrackerService {
    db: Database,
}

impl TrackerService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Users ---

    pub fn create_user(&self, name: &str, api_key: &str) -> Result<User> {
        self.db.create_user(name, api_key)
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        self.db.get_user_by_name(name)
    }

    pub fn find_user_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.db.find_user_by_api_key(api_key)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.db.list_users()
    }

    // --- Exercises ---

    pub fn create_exercise(&self, owner: i64, exercise: &NewExercise) -> Result<Exercise> {
        self.db.insert_exercise(owner, exercise)
    }

    pub fn get_exercise(&self, owner: i64, id: i64) -> Result<Exercise> {
        self.db.get_exercise(owner, id)
    }

    pub fn get_exercise_by_name(&self, owner: i64, name: &str) -> Result<Exercise> {
        self.db.get_exercise_by_name(owner, name)
    }

    pub fn list_exercises(&self, owner: i64) -> Result<Vec<Exercise>> {
        self.db.list_exercises(owner)
    }

    pub fn update_exercise(
        &self,
        owner: i64,
        id: i64,
        update: &UpdateExercise,
    ) -> Result<Exercise> {
        self.db.update_exercise(owner, id, update)
    }

    pub fn delete_exercise(&self, owner: i64, id: i64) -> Result<()> {
        self.db.delete_exercise(owner, id)
    }

    // --- Readings ---

    pub fn log_reading(&self, owner: i64, value: f64, reading_type: &str) -> Result<Reading> {
        self.db.insert_reading(
            owner,
            &NewReading {
                value,
                reading_type: reading_type.to_string(),
            },
        )
    }

    pub fn get_reading(&self, owner: i64, id: i64) -> Result<Reading> {
        self.db.get_reading(owner, id)
    }

    pub fn list_readings(&self, owner: i64, reading_type: Option<&str>) -> Result<Vec<Reading>> {
        self.db.list_readings(owner, reading_type)
    }

    pub fn delete_reading(&self, owner: i64, id: i64) -> Result<()> {
        self.db.delete_reading(owner, id)
    }

    // --- Entries ---

    pub fn create_entry(&self, owner: i64, entry: &NewEntry) -> Result<Entry> {
        self.db.insert_entry(owner, entry)
    }

    pub fn get_entry(&self, owner: i64, id: i64) -> Result<Entry> {
        self.db.get_entry(owner, id)
    }

    pub fn list_entries(&self, owner: i64, exercise_id: Option<i64>) -> Result<Vec<Entry>> {
        self.db.list_entries(owner, exercise_id)
    }

    pub fn update_entry(&self, owner: i64, id: i64, update: &UpdateEntry) -> Result<Entry> {
        self.db.update_entry(owner, id, update)
    }

    pub fn delete_entry(&self, owner: i64, id: i64) -> Result<bool> {
        self.db.delete_entry(owner, id)
    }

    /// One-shot session logging: create a before reading, an after
    /// reading, and a completed entry linking them.
    ///
    /// All inputs are validated up front so a failure cannot leave
    /// orphaned readings behind.
    pub fn record_session(
        &self,
        owner: i64,
        exercise_id: i64,
        before_value: f64,
        after_value: f64,
        duration_minutes: Option<i64>,
        notes: &str,
        sugar_grams: Option<f64>,
    ) -> Result<Entry> {
        self.db.get_exercise(owner, exercise_id)?;
        validate_reading_value(before_value)?;
        validate_reading_value(after_value)?;
        if let Some(minutes) = duration_minutes {
            validate_duration(minutes)?;
        }
        if let Some(grams) = sugar_grams {
            validate_sugar_grams(grams)?;
        }

        let before = self.db.insert_reading(
            owner,
            &NewReading {
                value: before_value,
                reading_type: READING_BEFORE.to_string(),
            },
        )?;
        let after = self.db.insert_reading(
            owner,
            &NewReading {
                value: after_value,
                reading_type: READING_AFTER.to_string(),
            },
        )?;
        self.db.insert_entry(
            owner,
            &NewEntry {
                exercise_id,
                before_reading_id: Some(before.id),
                after_reading_id: Some(after.id),
                duration_minutes,
                notes: notes.to_string(),
                sugar_grams,
            },
        )
    }

    // --- Statistics ---

    pub fn exercise_stats(&self, owner: i64, exercise_id: i64) -> Result<ExerciseStats> {
        self.db.average_blood_sugar_change(owner, exercise_id)
    }

    pub fn all_exercise_stats(&self, owner: i64) -> Result<Vec<ExerciseStats>> {
        self.db.list_exercise_stats(owner)
    }

    // --- Report ---

    pub fn build_clinician_report(&self, owner: i64) -> Result<String> {
        report::build_clinician_report(&self.db, owner)
    }

    // --- Snacks ---

    pub fn create_snack(&self, owner: i64, snack: &NewSnack) -> Result<Snack> {
        self.db.insert_snack(owner, snack)
    }

    pub fn get_snack(&self, owner: i64, id: i64) -> Result<Snack> {
        self.db.get_snack(owner, id)
    }

    pub fn list_snacks(&self, owner: i64) -> Result<Vec<Snack>> {
        self.db.list_snacks(owner)
    }

    pub fn update_snack(&self, owner: i64, id: i64, update: &UpdateSnack) -> Result<Snack> {
        self.db.update_snack(owner, id, update)
    }

    pub fn delete_snack(&self, owner: i64, id: i64) -> Result<bool> {
        self.db.delete_snack(owner, id)
    }
}

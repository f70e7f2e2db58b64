use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;
use rusqlite::{Connection, params};

use crate::models::{
    Entry, Exercise, ExerciseStats, NewEntry, NewExercise, NewReading, NewSnack, Reading,
    READING_AFTER, READING_BEFORE, Snack, UpdateEntry, UpdateExercise, UpdateSnack, User,
    blood_sugar_diff, validate_duration, validate_intensity, validate_name,
    validate_reading_type, validate_reading_value, validate_sugar_grams,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    api_key TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS exercises (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    intensity TEXT NOT NULL DEFAULT 'medium',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS readings (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    value REAL NOT NULL,
                    reading_type TEXT NOT NULL CHECK (reading_type IN ('before', 'after')),
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    exercise_id INTEGER NOT NULL REFERENCES exercises(id),
                    date TEXT NOT NULL,
                    before_reading_id INTEGER REFERENCES readings(id),
                    after_reading_id INTEGER REFERENCES readings(id),
                    duration_minutes INTEGER,
                    notes TEXT NOT NULL DEFAULT '',
                    sugar_grams REAL NOT NULL DEFAULT 0,
                    completed INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS snacks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    sugar_grams REAL NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE UNIQUE INDEX IF NOT EXISTS idx_exercises_owner_name
                    ON exercises(user_id, name);
                CREATE INDEX IF NOT EXISTS idx_readings_owner ON readings(user_id);
                CREATE INDEX IF NOT EXISTS idx_entries_owner_exercise
                    ON entries(user_id, exercise_id);
                CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_before_reading
                    ON entries(before_reading_id) WHERE before_reading_id IS NOT NULL;
                CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_after_reading
                    ON entries(after_reading_id) WHERE after_reading_id IS NOT NULL;

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    fn now() -> String {
        Local::now().to_rfc3339()
    }

    fn today() -> String {
        Local::now().date_naive().format("%Y-%m-%d").to_string()
    }

    // --- Row mapping helpers ---

    fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            api_key: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn exercise_from_row(row: &rusqlite::Row) -> rusqlite::Result<Exercise> {
        Ok(Exercise {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            intensity: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn reading_from_row(row: &rusqlite::Row) -> rusqlite::Result<Reading> {
        Ok(Reading {
            id: row.get(0)?,
            user_id: row.get(1)?,
            value: row.get(2)?,
            reading_type: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    // Expects columns:
    // 0: e.id, 1: e.user_id, 2: e.exercise_id, 3: e.date,
    // 4: e.before_reading_id, 5: e.after_reading_id, 6: e.duration_minutes,
    // 7: e.notes, 8: e.sugar_grams, 9: e.completed, 10: e.created_at,
    // 11: e.updated_at, 12: x.name, 13: br.value, 14: ar.value
    fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let before_value: Option<f64> = row.get(13)?;
        let after_value: Option<f64> = row.get(14)?;
        Ok(Entry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            exercise_id: row.get(2)?,
            date: row.get(3)?,
            before_reading_id: row.get(4)?,
            after_reading_id: row.get(5)?,
            duration_minutes: row.get(6)?,
            notes: row.get(7)?,
            sugar_grams: row.get(8)?,
            completed: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            exercise_name: Some(row.get(12)?),
            before_value,
            after_value,
            blood_sugar_diff: blood_sugar_diff(before_value, after_value),
        })
    }

    fn snack_from_row(row: &rusqlite::Row) -> rusqlite::Result<Snack> {
        Ok(Snack {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            sugar_grams: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    const ENTRY_SELECT: &'static str =
        "SELECT e.id, e.user_id, e.exercise_id, e.date, e.before_reading_id, e.after_reading_id,
                e.duration_minutes, e.notes, e.sugar_grams, e.completed, e.created_at, e.updated_at,
                x.name, br.value, ar.value
         FROM entries e
         JOIN exercises x ON e.exercise_id = x.id
         LEFT JOIN readings br ON e.before_reading_id = br.id
         LEFT JOIN readings ar ON e.after_reading_id = ar.id";

    // --- Users ---

    pub fn create_user(&self, name: &str, api_key: &str) -> Result<User> {
        let name = validate_name("User", name)?;
        if self.get_user_by_name(&name)?.is_some() {
            bail!("User '{name}' already exists");
        }
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO users (name, api_key, created_at) VALUES (?1, ?2, ?3)",
            params![name, api_key, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT id, name, api_key, created_at FROM users WHERE id = ?1",
                params![id],
                Self::user_from_row,
            )
            .context("User not found after insert")
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, api_key, created_at FROM users WHERE name = ?1")?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn find_user_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, api_key, created_at FROM users WHERE api_key = ?1")?;
        let mut rows = stmt.query(params![api_key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, api_key, created_at FROM users ORDER BY name")?;
        let users = stmt
            .query_map([], Self::user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    // --- Exercises ---

    pub fn insert_exercise(&self, owner: i64, exercise: &NewExercise) -> Result<Exercise> {
        let name = validate_name("Exercise", &exercise.name)?;
        let intensity = validate_intensity(&exercise.intensity)?;
        if self.exercise_name_taken(owner, &name, None)? {
            bail!("Exercise '{name}' already exists");
        }
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO exercises (user_id, name, description, intensity, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![owner, name, exercise.description, intensity, now, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_exercise(owner, id)
    }

    pub fn get_exercise(&self, owner: i64, id: i64) -> Result<Exercise> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, description, intensity, created_at, updated_at
                 FROM exercises WHERE id = ?1 AND user_id = ?2",
                params![id, owner],
                Self::exercise_from_row,
            )
            .context("Exercise not found")
    }

    pub fn get_exercise_by_name(&self, owner: i64, name: &str) -> Result<Exercise> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, description, intensity, created_at, updated_at
                 FROM exercises WHERE user_id = ?1 AND name = ?2",
                params![owner, name],
                Self::exercise_from_row,
            )
            .context(format!("Exercise '{name}' not found"))
    }

    pub fn list_exercises(&self, owner: i64) -> Result<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, description, intensity, created_at, updated_at
             FROM exercises WHERE user_id = ?1 ORDER BY name",
        )?;
        let exercises = stmt
            .query_map(params![owner], Self::exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises)
    }

    pub fn update_exercise(
        &self,
        owner: i64,
        id: i64,
        update: &UpdateExercise,
    ) -> Result<Exercise> {
        let current = self.get_exercise(owner, id)?;

        let name = match &update.name {
            Some(n) => validate_name("Exercise", n)?,
            None => current.name,
        };
        let intensity = match &update.intensity {
            Some(i) => validate_intensity(i)?,
            None => current.intensity,
        };
        let description = update
            .description
            .clone()
            .unwrap_or(current.description);

        if self.exercise_name_taken(owner, &name, Some(id))? {
            bail!("Exercise '{name}' already exists");
        }

        let now = Self::now();
        self.conn.execute(
            "UPDATE exercises SET name = ?1, description = ?2, intensity = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![name, description, intensity, now, id, owner],
        )?;
        self.get_exercise(owner, id)
    }

    /// Delete an exercise and, first, the owner's entries that reference
    /// it. Reference clearing is explicit; nothing relies on store-level
    /// cascade rules.
    pub fn delete_exercise(&self, owner: i64, id: i64) -> Result<()> {
        self.get_exercise(owner, id)?;
        self.conn.execute(
            "DELETE FROM entries WHERE exercise_id = ?1 AND user_id = ?2",
            params![id, owner],
        )?;
        self.conn.execute(
            "DELETE FROM exercises WHERE id = ?1 AND user_id = ?2",
            params![id, owner],
        )?;
        Ok(())
    }

    fn exercise_name_taken(&self, owner: i64, name: &str, exclude: Option<i64>) -> Result<bool> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM exercises WHERE user_id = ?1 AND name = ?2 AND id != ?3",
        )?;
        let mut rows = stmt.query(params![owner, name, exclude.unwrap_or(-1)])?;
        Ok(rows.next()?.is_some())
    }

    // --- Readings ---

    pub fn insert_reading(&self, owner: i64, reading: &NewReading) -> Result<Reading> {
        let reading_type = validate_reading_type(&reading.reading_type)?;
        let value = validate_reading_value(reading.value)?;
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO readings (user_id, value, reading_type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![owner, value, reading_type, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_reading(owner, id)
    }

    pub fn get_reading(&self, owner: i64, id: i64) -> Result<Reading> {
        self.conn
            .query_row(
                "SELECT id, user_id, value, reading_type, created_at
                 FROM readings WHERE id = ?1 AND user_id = ?2",
                params![id, owner],
                Self::reading_from_row,
            )
            .context("Reading not found")
    }

    pub fn list_readings(&self, owner: i64, reading_type: Option<&str>) -> Result<Vec<Reading>> {
        let readings = match reading_type {
            Some(rt) => {
                let rt = validate_reading_type(rt)?;
                let mut stmt = self.conn.prepare(
                    "SELECT id, user_id, value, reading_type, created_at
                     FROM readings WHERE user_id = ?1 AND reading_type = ?2 ORDER BY id DESC",
                )?;
                stmt.query_map(params![owner, rt], Self::reading_from_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, user_id, value, reading_type, created_at
                     FROM readings WHERE user_id = ?1 ORDER BY id DESC",
                )?;
                stmt.query_map(params![owner], Self::reading_from_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(readings)
    }

    /// Delete a reading. Any entry referencing it has that reference
    /// cleared, not the entry deleted. The entry's `completed` flag is
    /// left as-is; it is recomputed on the entry's next save.
    pub fn delete_reading(&self, owner: i64, id: i64) -> Result<()> {
        self.get_reading(owner, id)?;
        let now = Self::now();
        self.conn.execute(
            "UPDATE entries SET before_reading_id = NULL, updated_at = ?1
             WHERE before_reading_id = ?2 AND user_id = ?3",
            params![now, id, owner],
        )?;
        self.conn.execute(
            "UPDATE entries SET after_reading_id = NULL, updated_at = ?1
             WHERE after_reading_id = ?2 AND user_id = ?3",
            params![now, id, owner],
        )?;
        self.conn.execute(
            "DELETE FROM readings WHERE id = ?1 AND user_id = ?2",
            params![id, owner],
        )?;
        Ok(())
    }

    // --- Entries ---

    pub fn insert_entry(&self, owner: i64, entry: &NewEntry) -> Result<Entry> {
        self.get_exercise(owner, entry.exercise_id)?;

        if let Some(reading_id) = entry.before_reading_id {
            self.check_reading_link(owner, reading_id, READING_BEFORE, None)?;
        }
        if let Some(reading_id) = entry.after_reading_id {
            self.check_reading_link(owner, reading_id, READING_AFTER, None)?;
        }
        let duration = entry.duration_minutes.map(validate_duration).transpose()?;
        let sugar_grams = validate_sugar_grams(entry.sugar_grams.unwrap_or(0.0))?;

        let completed = entry.before_reading_id.is_some() && entry.after_reading_id.is_some();
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO entries (user_id, exercise_id, date, before_reading_id, after_reading_id,
                                  duration_minutes, notes, sugar_grams, completed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                owner,
                entry.exercise_id,
                Self::today(),
                entry.before_reading_id,
                entry.after_reading_id,
                duration,
                entry.notes,
                sugar_grams,
                completed,
                now,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_entry(owner, id)
    }

    pub fn get_entry(&self, owner: i64, id: i64) -> Result<Entry> {
        self.conn
            .query_row(
                &format!("{} WHERE e.id = ?1 AND e.user_id = ?2", Self::ENTRY_SELECT),
                params![id, owner],
                Self::entry_from_row,
            )
            .context("Entry not found")
    }

    pub fn list_entries(&self, owner: i64, exercise_id: Option<i64>) -> Result<Vec<Entry>> {
        let entries = match exercise_id {
            Some(xid) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{} WHERE e.user_id = ?1 AND e.exercise_id = ?2 ORDER BY e.date DESC, e.id DESC",
                    Self::ENTRY_SELECT
                ))?;
                stmt.query_map(params![owner, xid], Self::entry_from_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "{} WHERE e.user_id = ?1 ORDER BY e.date DESC, e.id DESC",
                    Self::ENTRY_SELECT
                ))?;
                stmt.query_map(params![owner], Self::entry_from_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(entries)
    }

    /// Update an entry. Reading-link validation is re-applied to the
    /// merged state, and `completed` is recomputed from the merged links
    /// and written in the same statement — it never survives from the
    /// previous row state.
    pub fn update_entry(&self, owner: i64, id: i64, update: &UpdateEntry) -> Result<Entry> {
        let current = self.get_entry(owner, id)?;

        let exercise_id = update.exercise_id.unwrap_or(current.exercise_id);
        if exercise_id != current.exercise_id {
            self.get_exercise(owner, exercise_id)?;
        }

        let before_reading_id = match update.before_reading_id {
            Some(link) => link,
            None => current.before_reading_id,
        };
        let after_reading_id = match update.after_reading_id {
            Some(link) => link,
            None => current.after_reading_id,
        };
        if let Some(reading_id) = before_reading_id {
            self.check_reading_link(owner, reading_id, READING_BEFORE, Some(id))?;
        }
        if let Some(reading_id) = after_reading_id {
            self.check_reading_link(owner, reading_id, READING_AFTER, Some(id))?;
        }

        let duration_minutes = match update.duration_minutes {
            Some(d) => d.map(validate_duration).transpose()?,
            None => current.duration_minutes,
        };
        let notes = update.notes.clone().unwrap_or(current.notes);
        let sugar_grams = match update.sugar_grams {
            Some(g) => validate_sugar_grams(g)?,
            None => current.sugar_grams,
        };

        let completed = before_reading_id.is_some() && after_reading_id.is_some();
        let now = Self::now();
        self.conn.execute(
            "UPDATE entries SET exercise_id = ?1, before_reading_id = ?2, after_reading_id = ?3,
                    duration_minutes = ?4, notes = ?5, sugar_grams = ?6, completed = ?7,
                    updated_at = ?8
             WHERE id = ?9 AND user_id = ?10",
            params![
                exercise_id,
                before_reading_id,
                after_reading_id,
                duration_minutes,
                notes,
                sugar_grams,
                completed,
                now,
                id,
                owner,
            ],
        )?;
        self.get_entry(owner, id)
    }

    pub fn delete_entry(&self, owner: i64, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM entries WHERE id = ?1 AND user_id = ?2",
            params![id, owner],
        )?;
        Ok(rows > 0)
    }

    /// Validate one reading link: the reading must exist under this owner,
    /// carry the expected type, and not already be linked to another entry
    /// in the same slot (readings pair one-to-one with entries).
    fn check_reading_link(
        &self,
        owner: i64,
        reading_id: i64,
        expected_type: &str,
        exclude_entry: Option<i64>,
    ) -> Result<()> {
        let reading = self
            .get_reading(owner, reading_id)
            .context("Referenced reading not found")?;
        if reading.reading_type != expected_type {
            bail!("{expected_type} reading must have type '{expected_type}' (reading {reading_id} has type '{}')",
                reading.reading_type);
        }
        let column = match expected_type {
            READING_BEFORE => "before_reading_id",
            _ => "after_reading_id",
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id FROM entries WHERE {column} = ?1 AND id != ?2"
        ))?;
        let mut rows = stmt.query(params![reading_id, exclude_entry.unwrap_or(-1)])?;
        if let Some(row) = rows.next()? {
            let other: i64 = row.get(0)?;
            bail!("Reading {reading_id} is already linked to entry {other} as its {expected_type} reading");
        }
        Ok(())
    }

    // --- Exercise statistics ---

    /// Average blood sugar change across an exercise's completed entries.
    ///
    /// Scans `completed` entries and accumulates each one's diff. A
    /// completed entry whose diff is unavailable (a linked reading was
    /// deleted and the entry not yet re-saved) is skipped rather than
    /// treated as an error. Zero completed entries yields an average of 0
    /// with a count of 0.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_blood_sugar_change(
        &self,
        owner: i64,
        exercise_id: i64,
    ) -> Result<ExerciseStats> {
        let exercise = self.get_exercise(owner, exercise_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT br.value, ar.value
             FROM entries e
             LEFT JOIN readings br ON e.before_reading_id = br.id
             LEFT JOIN readings ar ON e.after_reading_id = ar.id
             WHERE e.user_id = ?1 AND e.exercise_id = ?2 AND e.completed = 1",
        )?;
        let pairs = stmt
            .query_map(params![owner, exercise_id], |row| {
                Ok((row.get::<_, Option<f64>>(0)?, row.get::<_, Option<f64>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sum = 0.0;
        let mut count: i64 = 0;
        for (before, after) in pairs {
            if let Some(diff) = blood_sugar_diff(before, after) {
                sum += diff;
                count += 1;
            }
        }

        let average_change = if count > 0 { sum / count as f64 } else { 0.0 };
        Ok(ExerciseStats {
            exercise_id: exercise.id,
            exercise_name: exercise.name,
            intensity: exercise.intensity,
            average_change,
            completed_entries: count,
        })
    }

    /// Stats for every exercise the owner has, in name order. Recomputed
    /// from the entries on every call; nothing derived is stored.
    pub fn list_exercise_stats(&self, owner: i64) -> Result<Vec<ExerciseStats>> {
        let mut stats = Vec::new();
        for exercise in self.list_exercises(owner)? {
            stats.push(self.average_blood_sugar_change(owner, exercise.id)?);
        }
        Ok(stats)
    }

    // --- Snacks ---

    pub fn insert_snack(&self, owner: i64, snack: &NewSnack) -> Result<Snack> {
        let name = validate_name("Snack", &snack.name)?;
        let sugar_grams = validate_sugar_grams(snack.sugar_grams.unwrap_or(0.0))?;
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO snacks (user_id, name, description, sugar_grams, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![owner, name, snack.description, sugar_grams, now, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_snack(owner, id)
    }

    pub fn get_snack(&self, owner: i64, id: i64) -> Result<Snack> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, description, sugar_grams, created_at, updated_at
                 FROM snacks WHERE id = ?1 AND user_id = ?2",
                params![id, owner],
                Self::snack_from_row,
            )
            .context("Snack not found")
    }

    pub fn list_snacks(&self, owner: i64) -> Result<Vec<Snack>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, description, sugar_grams, created_at, updated_at
             FROM snacks WHERE user_id = ?1 ORDER BY name",
        )?;
        let snacks = stmt
            .query_map(params![owner], Self::snack_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(snacks)
    }

    pub fn update_snack(&self, owner: i64, id: i64, update: &UpdateSnack) -> Result<Snack> {
        let current = self.get_snack(owner, id)?;

        let name = match &update.name {
            Some(n) => validate_name("Snack", n)?,
            None => current.name,
        };
        let description = update
            .description
            .clone()
            .unwrap_or(current.description);
        let sugar_grams = match update.sugar_grams {
            Some(g) => validate_sugar_grams(g)?,
            None => current.sugar_grams,
        };

        let now = Self::now();
        self.conn.execute(
            "UPDATE snacks SET name = ?1, description = ?2, sugar_grams = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![name, description, sugar_grams, now, id, owner],
        )?;
        self.get_snack(owner, id)
    }

    pub fn delete_snack(&self, owner: i64, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM snacks WHERE id = ?1 AND user_id = ?2",
            params![id, owner],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewEntry, NewExercise, NewReading, NewSnack, UpdateEntry};

    fn test_db() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("alice", "alice-key").unwrap();
        (db, user.id)
    }

    fn other_user(db: &Database) -> i64 {
        db.create_user("bob", "bob-key").unwrap().id
    }

    fn sample_exercise() -> NewExercise {
        NewExercise {
            name: "Running".to_string(),
            description: "5k around the park".to_string(),
            intensity: "high".to_string(),
        }
    }

    fn add_reading(db: &Database, owner: i64, value: f64, reading_type: &str) -> Reading {
        db.insert_reading(
            owner,
            &NewReading {
                value,
                reading_type: reading_type.to_string(),
            },
        )
        .unwrap()
    }

    fn add_completed_entry(
        db: &Database,
        owner: i64,
        exercise_id: i64,
        before: f64,
        after: f64,
    ) -> Entry {
        let b = add_reading(db, owner, before, "before");
        let a = add_reading(db, owner, after, "after");
        db.insert_entry(
            owner,
            &NewEntry {
                exercise_id,
                before_reading_id: Some(b.id),
                after_reading_id: Some(a.id),
                ..NewEntry::default()
            },
        )
        .unwrap()
    }

    // --- Users ---

    #[test]
    fn test_create_and_find_user() {
        let (db, _) = test_db();
        let user = db.get_user_by_name("alice").unwrap().unwrap();
        assert_eq!(user.name, "alice");

        let by_key = db.find_user_by_api_key("alice-key").unwrap().unwrap();
        assert_eq!(by_key.id, user.id);

        assert!(db.find_user_by_api_key("wrong-key").unwrap().is_none());
        assert!(db.get_user_by_name("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_user_name_rejected() {
        let (db, _) = test_db();
        assert!(db.create_user("alice", "another-key").is_err());
    }

    // --- Exercises ---

    #[test]
    fn test_insert_and_get_exercise() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();

        assert_eq!(exercise.name, "Running");
        assert_eq!(exercise.intensity, "high");

        let fetched = db.get_exercise(owner, exercise.id).unwrap();
        assert_eq!(fetched.id, exercise.id);
        let by_name = db.get_exercise_by_name(owner, "Running").unwrap();
        assert_eq!(by_name.id, exercise.id);
    }

    #[test]
    fn test_exercise_intensity_validated() {
        let (db, owner) = test_db();
        let result = db.insert_exercise(
            owner,
            &NewExercise {
                name: "Yoga".to_string(),
                description: String::new(),
                intensity: "extreme".to_string(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_exercise_name_same_owner_rejected() {
        let (db, owner) = test_db();
        db.insert_exercise(owner, &sample_exercise()).unwrap();
        let result = db.insert_exercise(owner, &sample_exercise());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Running"));
    }

    #[test]
    fn test_duplicate_exercise_name_different_owner_allowed() {
        let (db, owner) = test_db();
        let bob = other_user(&db);
        db.insert_exercise(owner, &sample_exercise()).unwrap();
        assert!(db.insert_exercise(bob, &sample_exercise()).is_ok());
    }

    #[test]
    fn test_update_exercise() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();

        let updated = db
            .update_exercise(
                owner,
                exercise.id,
                &UpdateExercise {
                    name: Some("Trail running".to_string()),
                    intensity: Some("medium".to_string()),
                    ..UpdateExercise::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Trail running");
        assert_eq!(updated.intensity, "medium");
        assert_eq!(updated.description, "5k around the park");
    }

    #[test]
    fn test_update_exercise_duplicate_name_rejected() {
        let (db, owner) = test_db();
        db.insert_exercise(owner, &sample_exercise()).unwrap();
        let other = db
            .insert_exercise(
                owner,
                &NewExercise {
                    name: "Cycling".to_string(),
                    description: String::new(),
                    intensity: "low".to_string(),
                },
            )
            .unwrap();

        let result = db.update_exercise(
            owner,
            other.id,
            &UpdateExercise {
                name: Some("Running".to_string()),
                ..UpdateExercise::default()
            },
        );
        assert!(result.is_err());

        // Re-saving under its own name is fine
        assert!(
            db.update_exercise(
                owner,
                other.id,
                &UpdateExercise {
                    name: Some("Cycling".to_string()),
                    ..UpdateExercise::default()
                },
            )
            .is_ok()
        );
    }

    #[test]
    fn test_delete_exercise_removes_its_entries() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let entry = add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);

        db.delete_exercise(owner, exercise.id).unwrap();
        assert!(db.get_exercise(owner, exercise.id).is_err());
        assert!(db.get_entry(owner, entry.id).is_err());
        // The readings themselves survive
        assert_eq!(db.list_readings(owner, None).unwrap().len(), 2);
    }

    #[test]
    fn test_exercise_cross_user_is_not_found() {
        let (db, owner) = test_db();
        let bob = other_user(&db);
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();

        assert!(db.get_exercise(bob, exercise.id).is_err());
        assert!(db.update_exercise(bob, exercise.id, &UpdateExercise::default()).is_err());
        assert!(db.delete_exercise(bob, exercise.id).is_err());
        assert!(db.list_exercises(bob).unwrap().is_empty());
        // Still present for its owner
        assert!(db.get_exercise(owner, exercise.id).is_ok());
    }

    // --- Readings ---

    #[test]
    fn test_insert_reading_rounds_value() {
        let (db, owner) = test_db();
        let reading = add_reading(&db, owner, 5.26, "before");
        assert!((reading.value - 5.3).abs() < f64::EPSILON);
        assert_eq!(reading.reading_type, "before");
    }

    #[test]
    fn test_insert_reading_rejects_bad_input() {
        let (db, owner) = test_db();
        assert!(
            db.insert_reading(
                owner,
                &NewReading {
                    value: -2.0,
                    reading_type: "before".to_string(),
                },
            )
            .is_err()
        );
        assert!(
            db.insert_reading(
                owner,
                &NewReading {
                    value: 5.0,
                    reading_type: "during".to_string(),
                },
            )
            .is_err()
        );
    }

    #[test]
    fn test_list_readings_filtered_by_type() {
        let (db, owner) = test_db();
        add_reading(&db, owner, 5.0, "before");
        add_reading(&db, owner, 6.0, "before");
        add_reading(&db, owner, 7.0, "after");

        assert_eq!(db.list_readings(owner, None).unwrap().len(), 3);
        assert_eq!(db.list_readings(owner, Some("before")).unwrap().len(), 2);
        assert_eq!(db.list_readings(owner, Some("after")).unwrap().len(), 1);
    }

    #[test]
    fn test_reading_cross_user_is_not_found() {
        let (db, owner) = test_db();
        let bob = other_user(&db);
        let reading = add_reading(&db, owner, 5.0, "before");

        assert!(db.get_reading(bob, reading.id).is_err());
        assert!(db.delete_reading(bob, reading.id).is_err());
        assert!(db.list_readings(bob, None).unwrap().is_empty());
        assert!(db.get_reading(owner, reading.id).is_ok());
    }

    #[test]
    fn test_delete_reading_clears_entry_reference() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let entry = add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);
        assert!(entry.completed);
        let before_id = entry.before_reading_id.unwrap();

        db.delete_reading(owner, before_id).unwrap();

        // Reference cleared, entry itself survives; completed is stale
        // until the next save.
        let reloaded = db.get_entry(owner, entry.id).unwrap();
        assert!(reloaded.before_reading_id.is_none());
        assert!(reloaded.after_reading_id.is_some());
        assert!(reloaded.completed);
        assert!(reloaded.blood_sugar_diff.is_none());

        // The next save recomputes the flag.
        let saved = db.update_entry(owner, entry.id, &UpdateEntry::default()).unwrap();
        assert!(!saved.completed);
    }

    // --- Entries ---

    #[test]
    fn test_insert_entry_minimal() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();

        let entry = db
            .insert_entry(
                owner,
                &NewEntry {
                    exercise_id: exercise.id,
                    ..NewEntry::default()
                },
            )
            .unwrap();

        assert!(!entry.completed);
        assert!(entry.blood_sugar_diff.is_none());
        assert_eq!(entry.sugar_grams, 0.0);
        assert_eq!(entry.exercise_name.as_deref(), Some("Running"));
        assert_eq!(entry.date, Local::now().date_naive().format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_insert_entry_with_both_readings_is_completed() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let entry = add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);

        assert!(entry.completed);
        assert!((entry.before_value.unwrap() - 5.0).abs() < f64::EPSILON);
        assert!((entry.after_value.unwrap() - 7.2).abs() < f64::EPSILON);
        assert!((entry.blood_sugar_diff.unwrap() - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_insert_entry_with_one_reading_is_incomplete() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let before = add_reading(&db, owner, 5.0, "before");

        let entry = db
            .insert_entry(
                owner,
                &NewEntry {
                    exercise_id: exercise.id,
                    before_reading_id: Some(before.id),
                    ..NewEntry::default()
                },
            )
            .unwrap();
        assert!(!entry.completed);
        assert!(entry.blood_sugar_diff.is_none());
    }

    #[test]
    fn test_entry_rejects_mismatched_reading_types() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let before = add_reading(&db, owner, 5.0, "before");
        let after = add_reading(&db, owner, 7.2, "after");

        // after reading in the before slot
        let result = db.insert_entry(
            owner,
            &NewEntry {
                exercise_id: exercise.id,
                before_reading_id: Some(after.id),
                ..NewEntry::default()
            },
        );
        assert!(result.is_err());

        // before reading in the after slot
        let result = db.insert_entry(
            owner,
            &NewEntry {
                exercise_id: exercise.id,
                after_reading_id: Some(before.id),
                ..NewEntry::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_rejects_foreign_readings() {
        let (db, owner) = test_db();
        let bob = other_user(&db);
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let bobs_reading = add_reading(&db, bob, 5.0, "before");

        let result = db.insert_entry(
            owner,
            &NewEntry {
                exercise_id: exercise.id,
                before_reading_id: Some(bobs_reading.id),
                ..NewEntry::default()
            },
        );
        assert!(result.is_err());
        // Indistinguishable from a missing reading
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_reading_linked_by_at_most_one_entry() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let before = add_reading(&db, owner, 5.0, "before");

        db.insert_entry(
            owner,
            &NewEntry {
                exercise_id: exercise.id,
                before_reading_id: Some(before.id),
                ..NewEntry::default()
            },
        )
        .unwrap();

        let result = db.insert_entry(
            owner,
            &NewEntry {
                exercise_id: exercise.id,
                before_reading_id: Some(before.id),
                ..NewEntry::default()
            },
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already linked"));
    }

    #[test]
    fn test_update_entry_keeps_own_readings() {
        // Re-validating an unchanged link must not trip the one-to-one
        // check against the entry itself.
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let entry = add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);

        let updated = db
            .update_entry(
                owner,
                entry.id,
                &UpdateEntry {
                    notes: Some("felt good".to_string()),
                    ..UpdateEntry::default()
                },
            )
            .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.notes, "felt good");
    }

    #[test]
    fn test_update_entry_attach_readings_completes() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let entry = db
            .insert_entry(
                owner,
                &NewEntry {
                    exercise_id: exercise.id,
                    ..NewEntry::default()
                },
            )
            .unwrap();
        assert!(!entry.completed);

        let before = add_reading(&db, owner, 5.0, "before");
        let after = add_reading(&db, owner, 7.2, "after");

        let updated = db
            .update_entry(
                owner,
                entry.id,
                &UpdateEntry {
                    before_reading_id: Some(Some(before.id)),
                    after_reading_id: Some(Some(after.id)),
                    ..UpdateEntry::default()
                },
            )
            .unwrap();
        assert!(updated.completed);
        assert!((updated.blood_sugar_diff.unwrap() - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_update_entry_clear_reading_uncompletes() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let entry = add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);

        let updated = db
            .update_entry(
                owner,
                entry.id,
                &UpdateEntry {
                    after_reading_id: Some(None),
                    ..UpdateEntry::default()
                },
            )
            .unwrap();
        assert!(!updated.completed);
        assert!(updated.after_reading_id.is_none());
        assert!(updated.blood_sugar_diff.is_none());
        // The detached reading still exists
        assert!(db.get_reading(owner, entry.after_reading_id.unwrap()).is_ok());
    }

    #[test]
    fn test_update_entry_rejects_stealing_linked_reading() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let first = add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);
        let second = db
            .insert_entry(
                owner,
                &NewEntry {
                    exercise_id: exercise.id,
                    ..NewEntry::default()
                },
            )
            .unwrap();

        let result = db.update_entry(
            owner,
            second.id,
            &UpdateEntry {
                before_reading_id: Some(first.before_reading_id),
                ..UpdateEntry::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_duration_and_sugar_validation() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();

        assert!(
            db.insert_entry(
                owner,
                &NewEntry {
                    exercise_id: exercise.id,
                    duration_minutes: Some(0),
                    ..NewEntry::default()
                },
            )
            .is_err()
        );
        assert!(
            db.insert_entry(
                owner,
                &NewEntry {
                    exercise_id: exercise.id,
                    sugar_grams: Some(-1.0),
                    ..NewEntry::default()
                },
            )
            .is_err()
        );

        let entry = db
            .insert_entry(
                owner,
                &NewEntry {
                    exercise_id: exercise.id,
                    duration_minutes: Some(45),
                    sugar_grams: Some(12.5),
                    notes: "intervals".to_string(),
                    ..NewEntry::default()
                },
            )
            .unwrap();
        assert_eq!(entry.duration_minutes, Some(45));
        assert!((entry.sugar_grams - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_entry_unknown_exercise_is_not_found() {
        let (db, owner) = test_db();
        let result = db.insert_entry(
            owner,
            &NewEntry {
                exercise_id: 999,
                ..NewEntry::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_list_entries_scoped_and_filtered() {
        let (db, owner) = test_db();
        let bob = other_user(&db);
        let running = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let cycling = db
            .insert_exercise(
                owner,
                &NewExercise {
                    name: "Cycling".to_string(),
                    description: String::new(),
                    intensity: "low".to_string(),
                },
            )
            .unwrap();
        add_completed_entry(&db, owner, running.id, 5.0, 7.2);
        add_completed_entry(&db, owner, cycling.id, 6.0, 5.5);

        assert_eq!(db.list_entries(owner, None).unwrap().len(), 2);
        assert_eq!(db.list_entries(owner, Some(running.id)).unwrap().len(), 1);
        assert!(db.list_entries(bob, None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_entry() {
        let (db, owner) = test_db();
        let bob = other_user(&db);
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        let entry = add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);

        assert!(!db.delete_entry(bob, entry.id).unwrap());
        assert!(db.delete_entry(owner, entry.id).unwrap());
        assert!(!db.delete_entry(owner, entry.id).unwrap());
    }

    // --- Statistics ---

    #[test]
    fn test_average_change_no_entries() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();

        let stats = db.average_blood_sugar_change(owner, exercise.id).unwrap();
        assert_eq!(stats.completed_entries, 0);
        assert!((stats.average_change - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_change_over_diffs() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        // diffs: 2.2, -1.0, 0.8
        add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);
        add_completed_entry(&db, owner, exercise.id, 6.0, 5.0);
        add_completed_entry(&db, owner, exercise.id, 4.2, 5.0);

        let stats = db.average_blood_sugar_change(owner, exercise.id).unwrap();
        assert_eq!(stats.completed_entries, 3);
        assert!((stats.average_change - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_change_ignores_incomplete_entries() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);

        let before = add_reading(&db, owner, 9.9, "before");
        db.insert_entry(
            owner,
            &NewEntry {
                exercise_id: exercise.id,
                before_reading_id: Some(before.id),
                ..NewEntry::default()
            },
        )
        .unwrap();

        let stats = db.average_blood_sugar_change(owner, exercise.id).unwrap();
        assert_eq!(stats.completed_entries, 1);
        assert!((stats.average_change - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_average_change_skips_stale_completed_entries() {
        // A completed entry whose reading was deleted (flag not yet
        // recomputed) must be skipped, not faulted on.
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        add_completed_entry(&db, owner, exercise.id, 5.0, 7.2);
        let stale = add_completed_entry(&db, owner, exercise.id, 6.0, 5.0);
        db.delete_reading(owner, stale.before_reading_id.unwrap()).unwrap();

        let stats = db.average_blood_sugar_change(owner, exercise.id).unwrap();
        assert_eq!(stats.completed_entries, 1);
        assert!((stats.average_change - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_average_change_zero_average_with_data() {
        let (db, owner) = test_db();
        let exercise = db.insert_exercise(owner, &sample_exercise()).unwrap();
        add_completed_entry(&db, owner, exercise.id, 6.0, 6.0);

        // count distinguishes "no data" from a genuine zero average
        let stats = db.average_blood_sugar_change(owner, exercise.id).unwrap();
        assert_eq!(stats.completed_entries, 1);
        assert!((stats.average_change - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_list_exercise_stats() {
        let (db, owner) = test_db();
        let running = db.insert_exercise(owner, &sample_exercise()).unwrap();
        db.insert_exercise(
            owner,
            &NewExercise {
                name: "Cycling".to_string(),
                description: String::new(),
                intensity: "low".to_string(),
            },
        )
        .unwrap();
        add_completed_entry(&db, owner, running.id, 5.0, 7.2);

        let stats = db.list_exercise_stats(owner).unwrap();
        assert_eq!(stats.len(), 2);
        // name order
        assert_eq!(stats[0].exercise_name, "Cycling");
        assert_eq!(stats[0].completed_entries, 0);
        assert_eq!(stats[1].exercise_name, "Running");
        assert_eq!(stats[1].completed_entries, 1);
    }

    // --- Snacks ---

    #[test]
    fn test_snack_crud() {
        let (db, owner) = test_db();
        let snack = db
            .insert_snack(
                owner,
                &NewSnack {
                    name: "Banana".to_string(),
                    description: "medium".to_string(),
                    sugar_grams: Some(14.4),
                },
            )
            .unwrap();
        assert!((snack.sugar_grams - 14.4).abs() < f64::EPSILON);

        let updated = db
            .update_snack(
                owner,
                snack.id,
                &UpdateSnack {
                    sugar_grams: Some(12.0),
                    ..UpdateSnack::default()
                },
            )
            .unwrap();
        assert!((updated.sugar_grams - 12.0).abs() < f64::EPSILON);
        assert_eq!(updated.name, "Banana");

        assert_eq!(db.list_snacks(owner).unwrap().len(), 1);
        assert!(db.delete_snack(owner, snack.id).unwrap());
        assert!(db.get_snack(owner, snack.id).is_err());
    }

    #[test]
    fn test_snack_rejects_negative_sugar() {
        let (db, owner) = test_db();
        let result = db.insert_snack(
            owner,
            &NewSnack {
                name: "Mystery".to_string(),
                description: String::new(),
                sugar_grams: Some(-3.0),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_snack_cross_user_is_not_found() {
        let (db, owner) = test_db();
        let bob = other_user(&db);
        let snack = db
            .insert_snack(
                owner,
                &NewSnack {
                    name: "Banana".to_string(),
                    description: String::new(),
                    sugar_grams: None,
                },
            )
            .unwrap();

        assert!(db.get_snack(bob, snack.id).is_err());
        assert!(!db.delete_snack(bob, snack.id).unwrap());
        assert!(db.list_snacks(bob).unwrap().is_empty());
    }
}

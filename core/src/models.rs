use anyhow::{Result, bail};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub api_key: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Exercise {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub intensity: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A single blood sugar measurement in mmol/L, tagged with when it was
/// taken relative to an exercise session. Append-only: there is no update
/// operation; a wrong reading is deleted and re-created.
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub value: f64,
    pub reading_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub exercise_id: i64,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_reading_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_reading_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    pub notes: String,
    pub sugar_grams: f64,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
    // Joined fields for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_sugar_diff: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snack {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub sugar_grams: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-exercise aggregate: average blood sugar change across the
/// exercise's completed entries. `completed_entries` of 0 means "no data";
/// the average alone cannot distinguish that from a genuine average of 0.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseStats {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub intensity: String,
    pub average_change: f64,
    pub completed_entries: i64,
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub description: String,
    pub intensity: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateExercise {
    pub name: Option<String>,
    pub description: Option<String>,
    pub intensity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReading {
    pub value: f64,
    pub reading_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub exercise_id: i64,
    pub before_reading_id: Option<i64>,
    pub after_reading_id: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub notes: String,
    pub sugar_grams: Option<f64>,
}

/// Entry patch. The reading links and duration use `Option<Option<T>>`
/// so a caller can distinguish "leave unchanged" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct UpdateEntry {
    pub exercise_id: Option<i64>,
    pub before_reading_id: Option<Option<i64>>,
    pub after_reading_id: Option<Option<i64>>,
    pub duration_minutes: Option<Option<i64>>,
    pub notes: Option<String>,
    pub sugar_grams: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewSnack {
    pub name: String,
    pub description: String,
    pub sugar_grams: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSnack {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sugar_grams: Option<f64>,
}

pub const READING_BEFORE: &str = "before";
pub const READING_AFTER: &str = "after";

pub const READING_TYPES: &[&str] = &[READING_BEFORE, READING_AFTER];

pub const INTENSITY_LEVELS: &[&str] = &["low", "medium", "high"];

pub fn validate_reading_type(reading_type: &str) -> Result<String> {
    let lower = reading_type.to_lowercase();
    if READING_TYPES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid reading type '{reading_type}'. Must be one of: {}",
            READING_TYPES.join(", ")
        )
    }
}

pub fn validate_intensity(intensity: &str) -> Result<String> {
    let lower = intensity.to_lowercase();
    if INTENSITY_LEVELS.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid intensity '{intensity}'. Must be one of: {}",
            INTENSITY_LEVELS.join(", ")
        )
    }
}

/// Validate a blood sugar value (mmol/L) and normalize it to one
/// fractional digit. Readings are stored with tenth precision.
pub fn validate_reading_value(value: f64) -> Result<f64> {
    if !value.is_finite() {
        bail!("Blood sugar value must be a number");
    }
    if value <= 0.0 {
        bail!("Blood sugar value must be greater than 0");
    }
    if value >= 1000.0 {
        bail!("Blood sugar value must be less than 1000");
    }
    Ok(round_tenth(value))
}

pub fn validate_duration(minutes: i64) -> Result<i64> {
    if minutes <= 0 {
        bail!("duration_minutes must be greater than 0");
    }
    Ok(minutes)
}

/// Validate a sugar amount in grams and normalize to two fractional
/// digits. Zero is a legitimate amount and the default.
pub fn validate_sugar_grams(grams: f64) -> Result<f64> {
    if !grams.is_finite() {
        bail!("sugar_grams must be a number");
    }
    if grams < 0.0 {
        bail!("sugar_grams must not be negative");
    }
    if grams >= 10_000.0 {
        bail!("sugar_grams must be less than 10000");
    }
    Ok(round_hundredth(grams))
}

pub fn validate_name(what: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("{what} name must not be empty");
    }
    if trimmed.chars().count() > 100 {
        bail!("{what} name must be at most 100 characters");
    }
    Ok(trimmed.to_string())
}

/// Blood sugar change for a reading pair: after minus before when both
/// are present, otherwise no value. Absence is not zero — a zero diff
/// means the level did not move, absence means it cannot be computed.
#[must_use]
pub fn blood_sugar_diff(before: Option<f64>, after: Option<f64>) -> Option<f64> {
    match (before, after) {
        (Some(b), Some(a)) => Some(a - b),
        _ => None,
    }
}

#[must_use]
pub fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[must_use]
pub fn round_hundredth(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

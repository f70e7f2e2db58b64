use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use glucolog_core::db::Database;
use glucolog_core::models::{
    Entry, Exercise, ExerciseStats, NewEntry, NewExercise, NewReading, NewSnack, Reading, Snack,
    UpdateEntry, UpdateExercise, UpdateSnack,
};
use glucolog_core::report::build_clinician_report;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Database>>,
}

/// Owner resolved from the Bearer token, injected by `require_auth`.
#[derive(Clone, Copy)]
struct Owner(i64);

// --- Request / Response types ---

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

fn default_intensity() -> String {
    "medium".to_string()
}

#[derive(Deserialize)]
struct CreateExerciseRequest {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_intensity")]
    intensity: String,
}

#[derive(Deserialize)]
struct UpdateExerciseRequest {
    name: Option<String>,
    description: Option<String>,
    intensity: Option<String>,
}

#[derive(Deserialize)]
struct CreateReadingRequest {
    value: f64,
    reading_type: String,
}

#[derive(Deserialize)]
struct ReadingsQuery {
    #[serde(rename = "type")]
    reading_type: Option<String>,
}

#[derive(Deserialize)]
struct CreateEntryRequest {
    exercise_id: i64,
    before_reading_id: Option<i64>,
    after_reading_id: Option<i64>,
    duration_minutes: Option<i64>,
    #[serde(default)]
    notes: String,
    sugar_grams: Option<f64>,
}

#[derive(Deserialize)]
#[allow(clippy::option_option)]
struct UpdateEntryRequest {
    exercise_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    before_reading_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    after_reading_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    duration_minutes: Option<Option<i64>>,
    notes: Option<String>,
    sugar_grams: Option<f64>,
}

impl UpdateEntryRequest {
    fn is_empty(&self) -> bool {
        self.exercise_id.is_none()
            && self.before_reading_id.is_none()
            && self.after_reading_id.is_none()
            && self.duration_minutes.is_none()
            && self.notes.is_none()
            && self.sugar_grams.is_none()
    }
}

#[derive(Deserialize)]
struct CreateSessionRequest {
    exercise_id: i64,
    before_value: f64,
    after_value: f64,
    duration_minutes: Option<i64>,
    #[serde(default)]
    notes: String,
    sugar_grams: Option<f64>,
}

#[derive(Deserialize)]
struct EntriesQuery {
    exercise_id: Option<i64>,
}

#[derive(Deserialize)]
struct CreateSnackRequest {
    name: String,
    #[serde(default)]
    description: String,
    sugar_grams: Option<f64>,
}

#[derive(Deserialize)]
struct UpdateSnackRequest {
    name: Option<String>,
    description: Option<String>,
    sugar_grams: Option<f64>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                eprintln!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

/// Resolve the Bearer token to a user and stash the owner id in request
/// extensions. Rows of other users are invisible downstream, so a stolen
/// id can only produce "not found".
async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let user = token.and_then(|token| {
        let db = state
            .db
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        db.find_user_by_api_key(&token).ok().flatten()
    });

    match user {
        Some(user) => {
            request.extensions_mut().insert(Owner(user.id));
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or missing API key".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Exercise handlers ---

async fn create_exercise(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(req): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<Exercise>), ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let exercise = db
        .insert_exercise(
            owner,
            &NewExercise {
                name: req.name,
                description: req.description,
                intensity: req.intensity,
            },
        )
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

async fn list_exercises(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
) -> Result<Json<Vec<Exercise>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let exercises = db.list_exercises(owner).context("database error")?;
    Ok(Json(exercises))
}

async fn get_exercise(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<Json<Exercise>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let exercise = db
        .get_exercise(owner, id)
        .map_err(|_| ApiError::NotFound(format!("Exercise {id} not found")))?;
    Ok(Json(exercise))
}

async fn update_exercise(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateExerciseRequest>,
) -> Result<Json<Exercise>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    db.get_exercise(owner, id)
        .map_err(|_| ApiError::NotFound(format!("Exercise {id} not found")))?;
    let exercise = db
        .update_exercise(
            owner,
            id,
            &UpdateExercise {
                name: req.name,
                description: req.description,
                intensity: req.intensity,
            },
        )
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok(Json(exercise))
}

async fn delete_exercise(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    db.delete_exercise(owner, id)
        .map_err(|_| ApiError::NotFound(format!("Exercise {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Statistics handlers ---

async fn exercise_stats(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<Json<ExerciseStats>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let stats = db
        .average_blood_sugar_change(owner, id)
        .map_err(|_| ApiError::NotFound(format!("Exercise {id} not found")))?;
    Ok(Json(stats))
}

async fn all_stats(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
) -> Result<Json<Vec<ExerciseStats>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let stats = db.list_exercise_stats(owner).context("database error")?;
    Ok(Json(stats))
}

// --- Reading handlers ---

async fn create_reading(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(req): Json<CreateReadingRequest>,
) -> Result<(StatusCode, Json<Reading>), ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let reading = db
        .insert_reading(
            owner,
            &NewReading {
                value: req.value,
                reading_type: req.reading_type,
            },
        )
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok((StatusCode::CREATED, Json(reading)))
}

async fn list_readings(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Query(params): Query<ReadingsQuery>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let readings = db
        .list_readings(owner, params.reading_type.as_deref())
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok(Json(readings))
}

async fn delete_reading(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    db.delete_reading(owner, id)
        .map_err(|_| ApiError::NotFound(format!("Reading {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Entry handlers ---

async fn create_entry(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let entry = db
        .insert_entry(
            owner,
            &NewEntry {
                exercise_id: req.exercise_id,
                before_reading_id: req.before_reading_id,
                after_reading_id: req.after_reading_id,
                duration_minutes: req.duration_minutes,
                notes: req.notes,
                sugar_grams: req.sugar_grams,
            },
        )
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_entry(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<Json<Entry>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let entry = db
        .get_entry(owner, id)
        .map_err(|_| ApiError::NotFound(format!("Entry {id} not found")))?;
    Ok(Json(entry))
}

async fn list_entries(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Query(params): Query<EntriesQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let entries = db
        .list_entries(owner, params.exercise_id)
        .context("database error")?;
    Ok(Json(entries))
}

async fn update_entry(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<Entry>, ApiError> {
    if req.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one field must be provided".to_string(),
        ));
    }

    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    db.get_entry(owner, id)
        .map_err(|_| ApiError::NotFound(format!("Entry {id} not found")))?;
    let entry = db
        .update_entry(
            owner,
            id,
            &UpdateEntry {
                exercise_id: req.exercise_id,
                before_reading_id: req.before_reading_id,
                after_reading_id: req.after_reading_id,
                duration_minutes: req.duration_minutes,
                notes: req.notes,
                sugar_grams: req.sugar_grams,
            },
        )
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if db.delete_entry(owner, id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Entry {id} not found")))
    }
}

// --- Session handler ---

async fn create_session(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    // Validate everything before creating the readings so a bad request
    // leaves nothing behind.
    db.get_exercise(owner, req.exercise_id)
        .map_err(|_| ApiError::BadRequest(format!("Exercise {} not found", req.exercise_id)))?;
    glucolog_core::models::validate_reading_value(req.before_value)
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    glucolog_core::models::validate_reading_value(req.after_value)
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    if let Some(minutes) = req.duration_minutes {
        glucolog_core::models::validate_duration(minutes)
            .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    }
    if let Some(grams) = req.sugar_grams {
        glucolog_core::models::validate_sugar_grams(grams)
            .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    }

    let before = db
        .insert_reading(
            owner,
            &NewReading {
                value: req.before_value,
                reading_type: "before".to_string(),
            },
        )
        .context("failed to insert before reading")?;
    let after = db
        .insert_reading(
            owner,
            &NewReading {
                value: req.after_value,
                reading_type: "after".to_string(),
            },
        )
        .context("failed to insert after reading")?;
    let entry = db
        .insert_entry(
            owner,
            &NewEntry {
                exercise_id: req.exercise_id,
                before_reading_id: Some(before.id),
                after_reading_id: Some(after.id),
                duration_minutes: req.duration_minutes,
                notes: req.notes,
                sugar_grams: req.sugar_grams,
            },
        )
        .context("failed to insert entry")?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// --- Snack handlers ---

async fn create_snack(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(req): Json<CreateSnackRequest>,
) -> Result<(StatusCode, Json<Snack>), ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let snack = db
        .insert_snack(
            owner,
            &NewSnack {
                name: req.name,
                description: req.description,
                sugar_grams: req.sugar_grams,
            },
        )
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok((StatusCode::CREATED, Json(snack)))
}

async fn list_snacks(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
) -> Result<Json<Vec<Snack>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let snacks = db.list_snacks(owner).context("database error")?;
    Ok(Json(snacks))
}

async fn update_snack(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSnackRequest>,
) -> Result<Json<Snack>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    db.get_snack(owner, id)
        .map_err(|_| ApiError::NotFound(format!("Snack {id} not found")))?;
    let snack = db
        .update_snack(
            owner,
            id,
            &UpdateSnack {
                name: req.name,
                description: req.description,
                sugar_grams: req.sugar_grams,
            },
        )
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    Ok(Json(snack))
}

async fn delete_snack(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if db.delete_snack(owner, id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Snack {id} not found")))
    }
}

// --- Report handler ---

async fn export_report(
    State(state): State<AppState>,
    Extension(Owner(owner)): Extension<Owner>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = {
        let db = state
            .db
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        build_clinician_report(&db, owner).context("failed to build report")?
    };
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    ))
}

// --- Router builder ---

/// TLS configuration for the server.
pub struct TlsConfig {
    pub cert_path: std::path::PathBuf,
    pub key_path: std::path::PathBuf,
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/exercises", post(create_exercise).get(list_exercises))
        .route(
            "/api/exercises/{id}",
            get(get_exercise).put(update_exercise).delete(delete_exercise),
        )
        .route("/api/exercises/{id}/stats", get(exercise_stats))
        .route("/api/stats", get(all_stats))
        .route("/api/readings", post(create_reading).get(list_readings))
        .route("/api/readings/{id}", delete(delete_reading))
        .route("/api/entries", post(create_entry).get(list_entries))
        .route(
            "/api/entries/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/sessions", post(create_session))
        .route("/api/snacks", post(create_snack).get(list_snacks))
        .route("/api/snacks/{id}", put(update_snack).delete(delete_snack))
        .route("/api/report.csv", get(export_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    db: Database,
    port: u16,
    bind: &str,
    tls: Option<TlsConfig>,
) -> anyhow::Result<()> {
    let state = AppState {
        db: Arc::new(Mutex::new(db)),
    };

    let app = build_router(state);

    eprintln!(
        "Every request needs a per-user API key: Authorization: Bearer <key> (see `glucolog user add`)"
    );
    if bind != "127.0.0.1" && bind != "localhost" {
        eprintln!("Listening on {bind}: any device on your network can reach this API.");
    }

    if let Some(tls_config) = tls {
        let fingerprint = crate::tls::ensure_cert(&tls_config.cert_path, &tls_config.key_path)?;

        let rustls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            &tls_config.cert_path,
            &tls_config.key_path,
        )
        .await
        .context("failed to load TLS certificate")?;

        let addr = format!("{bind}:{port}")
            .parse::<std::net::SocketAddr>()
            .context("invalid bind address")?;

        eprintln!("Listening on https://{bind}:{port}");
        eprintln!("Certificate fingerprint (SHA-256):");
        eprintln!("  {fingerprint}");

        axum_server::bind_rustls(addr, rustls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
        eprintln!("Listening on http://{bind}:{port}");
        axum::serve(listener, app).await?;
    }

    Ok(())
}

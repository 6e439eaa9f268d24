//! HTTP dashboard API.
//!
//! Publishes the medication schedule as a medication source
//! (`GET /api/medications`), accepts schedule edits and dose confirmations,
//! and exposes the live due list and alert history.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::EmberConfig;
use crate::db;
use crate::reminder::clock::Clock;
use crate::reminder::due::check_due;
use crate::reminder::types::{Alert, Medication, MedicationLog, ScheduledMedication};
use crate::reminder::{alerts, schedule};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    config: Arc<EmberConfig>,
    fixed_clock: Option<Clock>,
}

impl AppState {
    pub fn new(conn: Connection, config: EmberConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
            fixed_clock: None,
        }
    }

    /// Pin "now" for every request.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.fixed_clock = Some(clock);
        self
    }

    fn clock(&self) -> Clock {
        self.fixed_clock
            .unwrap_or_else(|| Clock::system(self.config.reminder.time_basis))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|e| ApiError::Internal(format!("db lock poisoned: {e}")))
    }
}

/// API errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMedicationRequest {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub last_taken: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueMedication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    /// `"<name> (<dosage>) is due now!"`
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueResponse {
    pub due: Vec<DueMedication>,
    /// Names whose `last_taken` could not be read.
    pub malformed: Vec<String>,
}

/// Build the dashboard router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/medications", get(list_medications).post(add_medication))
        .route("/api/medications/due", get(due_medications))
        .route("/api/medications/{id}", delete(remove_medication))
        .route("/api/medications/{id}/taken", post(record_taken))
        .route("/api/alerts", get(recent_alerts))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": state.clock().now(),
    }))
}

async fn list_medications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Medication>>, ApiError> {
    let conn = state.conn()?;
    let meds = schedule::list_schedule(&conn)?
        .into_iter()
        .map(Medication::from)
        .collect();
    Ok(Json(meds))
}

async fn add_medication(
    State(state): State<AppState>,
    Json(req): Json<AddMedicationRequest>,
) -> Result<(StatusCode, Json<ScheduledMedication>), ApiError> {
    for (field, value) in [
        ("name", &req.name),
        ("dosage", &req.dosage),
        ("frequency", &req.frequency),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{field} is required")));
        }
    }

    let clock = state.clock();
    let conn = state.conn()?;
    let med = schedule::add_medication(
        &conn,
        &req.name,
        &req.dosage,
        &req.frequency,
        req.last_taken.as_deref(),
        &clock,
    )?;
    Ok((StatusCode::CREATED, Json(med)))
}

async fn remove_medication(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = state.conn()?;
    if schedule::remove_medication(&conn, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("medication {id}")))
    }
}

async fn record_taken(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MedicationLog>, ApiError> {
    let clock = state.clock();
    let mut conn = state.conn()?;
    schedule::log_dose_taken(&mut conn, &id, &clock)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("medication {id}")))
}

async fn due_medications(State(state): State<AppState>) -> Result<Json<DueResponse>, ApiError> {
    let clock = state.clock();
    let conn = state.conn()?;

    let mut response = DueResponse {
        due: Vec::new(),
        malformed: Vec::new(),
    };
    for med in schedule::list_schedule(&conn)? {
        match check_due(med.last_taken.as_deref(), &med.frequency, &clock) {
            Ok(true) => response.due.push(DueMedication {
                message: format!("{} ({}) is due now!", med.name, med.dosage),
                id: med.id,
                name: med.name,
                dosage: med.dosage,
            }),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(name = %med.name, error = %e, "treating medication as not due");
                response.malformed.push(med.name);
            }
        }
    }
    Ok(Json(response))
}

async fn recent_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    let limit = query.limit.unwrap_or(state.config.reminder.history_limit);
    let conn = state.conn()?;
    Ok(Json(alerts::recent_alerts(&conn, limit)?))
}

/// Open the database and serve the dashboard API until ctrl-c.
pub async fn serve(config: EmberConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    let bind_addr = config.bind_addr();

    let app = router(AppState::new(conn, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "dashboard listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down dashboard");
        })
        .await?;

    Ok(())
}

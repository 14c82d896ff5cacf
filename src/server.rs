use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::config::DEFAULT_WORKERS;
use crate::errors::ScanError;
use crate::jobs::{JobManager, JobState, JobStatus};
use crate::types::{DeviceSnapshot, LegendEntry, CLASS_LEGEND};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<JobManager>,
}

impl AppState {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub deep: bool,
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Serialize)]
struct StartResponse {
    job_id: Uuid,
    state: JobState,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// HTTP projection of `ScanError`: configuration problems are the caller's
/// fault, conflicts and unknown ids map to their native codes, everything
/// else stays a 500 with the detail kept server-side.
struct ApiError(ScanError);

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, key) = match &self.0 {
            ScanError::Configuration(_) => (StatusCode::BAD_REQUEST, "configuration"),
            ScanError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ScanError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(details = %self.0, "internal server error");
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorBody { error: key.into(), message })).into_response()
    }
}

/// API routes plus the static dashboard fallback.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/scan", post(start_scan))
        .route("/scan/status/{id}", get(scan_status))
        .route("/scan/cancel/{id}", post(cancel_scan))
        .route("/devices", get(get_devices))
        .route("/legend", get(get_legend))
        .with_state(state);

    let static_svc = ServeDir::new("ui").append_index_html_on_directories(true);

    Router::new()
        .nest("/api", api)
        .fallback_service(static_svc)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("serving dashboard on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn start_scan(
    State(app): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let workers = req.workers.unwrap_or(DEFAULT_WORKERS);
    let job_id = app.manager.start(req.deep, workers).await?;
    let resp = StartResponse {
        job_id,
        state: JobState::Pending,
    };
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

async fn scan_status(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatus>, ApiError> {
    Ok(Json(app.manager.status(id).await?))
}

async fn cancel_scan(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app.manager.cancel(id).await?;
    let status = app.manager.status(id).await?;
    Ok(Json(serde_json::json!({
        "job_id": status.id,
        "state": status.state,
        "cancel_requested": status.cancel_requested,
    })))
}

async fn get_devices(State(app): State<AppState>) -> Json<DeviceSnapshot> {
    Json(app.manager.devices().await)
}

async fn get_legend() -> Json<&'static [LegendEntry]> {
    Json(CLASS_LEGEND)
}

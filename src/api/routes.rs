use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::accrual::AccrualService;
use crate::error::Result;
use crate::export::build_archive;
use crate::ingest::read_batches;
use crate::observability::MetricsRegistry;
use crate::storage::Storage;

use super::request::collect_uploads;
use super::response::{ErrorResponse, HealthResponse, ReadyResponse};

/// Name of the archive returned by the upload endpoint.
const ARCHIVE_NAME: &str = "point-summary.zip";

/// Shared application state.
pub struct AppState {
    /// Accrual pipeline
    pub service: AccrualService,

    /// Storage backend, for readiness checks
    pub storage: Arc<dyn Storage>,

    pub metrics: Arc<MetricsRegistry>,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,

    /// Upload body limit in bytes
    pub max_upload_bytes: usize,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/api/v1/point/accumulate/upload", post(handle_upload))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Accrue points for uploaded purchase files and return the daily exports
/// as a zip archive.
async fn handle_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response> {
    let result = accumulate(&state, multipart).await;
    state.metrics.record_upload(result.is_ok());

    if let Err(e) = &result {
        warn!(code = e.code(), error = %e, "Upload rejected");
    }

    let archive = result?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_NAME}\""),
            ),
        ],
        archive,
    )
        .into_response())
}

async fn accumulate(state: &AppState, multipart: Multipart) -> Result<Vec<u8>> {
    let files = collect_uploads(multipart).await?;
    let file_count = files.len();

    let batches = read_batches(files)?;
    let report = state.service.execute(batches).await?;
    let archive = build_archive(&report.exports)?;

    info!(
        run_id = %report.run_id,
        files = file_count,
        exports = report.exports.len(),
        bytes = archive.len(),
        "Upload processed"
    );

    Ok(archive)
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
async fn handle_ready(State(state): State<Arc<AppState>>) -> Response {
    if let Err(e) = state.storage.health_check().await {
        warn!(error = %e, "Storage health check failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("NOT_READY", e.to_string())),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            storage: "ok".to_string(),
        }),
    )
        .into_response()
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = format!(
        r#"# HELP pointr_uptime_seconds Application uptime in seconds
# TYPE pointr_uptime_seconds counter
pointr_uptime_seconds {}

{}"#,
        state.start_time.elapsed().as_secs(),
        state.metrics.to_prometheus(),
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        metrics,
    )
}

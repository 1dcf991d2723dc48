use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use tracing::warn;

use super::error::ApiError;
use super::models::{ExportAccepted, HealthResponse, MetricsResponse};
use super::state::AppState;

const HEALTHY: &str = "healthy";
const UNHEALTHY: &str = "unhealthy";

/// Start an export (POST /api/v1/reports)
///
/// Returns as soon as the request is registered; the reports run in the
/// background and are polled through [`export_state`].
pub async fn start_export(State(state): State<AppState>) -> impl IntoResponse {
    let id = state.exporter.start().await;
    (StatusCode::CREATED, Json(ExportAccepted { id }))
}

/// Per-report status of one export (GET /api/v1/reports/{id})
///
/// Unknown ids are not an error: they read back as all `idle`.
pub async fn export_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    Json(state.exporter.state(&id).await)
}

/// Health check endpoint (GET /health, GET /operators/health)
///
/// Returns 503 when the ledger input location cannot be listed.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = HashMap::new();
    components.insert("api".to_string(), HEALTHY.to_string());
    components.insert("registry".to_string(), HEALTHY.to_string());

    let ledger = match state.exporter.probe_input().await {
        Ok(_) => HEALTHY,
        Err(e) => {
            warn!(
                input = %state.config.ledger.input_dir.display(),
                error = %e,
                "Ledger input is not readable"
            );
            UNHEALTHY
        }
    };
    components.insert("ledger".to_string(), ledger.to_string());

    let all_healthy = components.values().all(|status| status == HEALTHY);
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy { HEALTHY } else { UNHEALTHY }.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}

/// Counter snapshot (GET /operators/metrics)
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(MetricsResponse {
        counters: state.metrics.snapshot(),
        jobs: state.exporter.registry().stats().await,
        cached_files: state.exporter.cache().len(),
    })
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

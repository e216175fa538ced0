//! Health, info and metrics endpoints; none of them require a token

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::core::AppState;
use crate::system::metrics::collect_metrics;
use crate::system::{HealthChecker, HealthStatus, ServiceInfo, ServiceStatus};

/// `GET /api/v4/health/`
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthStatus>) {
    let health = HealthChecker::new(&state).check();
    let status = match health.status {
        ServiceStatus::Healthy => StatusCode::OK,
        ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(health))
}

/// `GET /api/v4/info/`
pub async fn system_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(HealthChecker::new(&state).info())
}

/// `GET /metrics` in the Prometheus text format
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    if !state.config.metrics.enable_prometheus {
        return StatusCode::NOT_FOUND.into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        collect_metrics(),
    )
        .into_response()
}

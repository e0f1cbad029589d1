//! Health check controller.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use cachet_core::{HealthCheck, HealthStatus};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: StoreHealth,
}

/// Health of the cache store.
#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Creates the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/live", get(liveness_check))
}

/// Reports the cache store's health.
///
/// A degraded store still serves requests (every lookup misses), so only
/// an unhealthy store turns the response into a 503.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.gateway.check().await;
    let code = if health.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let detail = match &health {
        HealthStatus::Healthy => None,
        HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => Some(reason.clone()),
    };

    let body = HealthResponse {
        status: health.label(),
        version: env!("CARGO_PKG_VERSION"),
        store: StoreHealth {
            name: state.gateway.name().to_string(),
            status: health.label(),
            detail,
        },
    };
    (code, Json(body))
}

/// Liveness check endpoint.
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

use crate::infrastructure::monitoring::{HealthStatus, SystemHealth};
use crate::presentation::http::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    #[serde(flatten)]
    health: SystemHealth,
    version: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.monitoring.health.perform_health_check().await;

    let code = match health.status {
        HealthStatus::Unhealthy => {
            tracing::error!(score = health.overall_score, "Service unhealthy");
            StatusCode::SERVICE_UNAVAILABLE
        }
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };

    let response = HealthResponse {
        health,
        version: env!("CARGO_PKG_VERSION"),
    };

    (code, Json(response))
}

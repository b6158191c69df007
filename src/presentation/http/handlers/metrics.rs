use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::time::Duration;

use crate::infrastructure::monitoring::{MetricRecord, PerformanceStats};
use crate::presentation::http::{errors::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Only requests from the last `range_ms` milliseconds; all when absent
    pub range_ms: Option<u64>,
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<PerformanceStats>, AppError> {
    if query.range_ms == Some(0) {
        return Err(AppError::BadRequest(
            "range_ms must be greater than zero".into(),
        ));
    }

    let stats = state
        .monitoring
        .performance
        .get_performance_stats(query.range_ms.map(Duration::from_millis))
        .await;
    Ok(Json(stats))
}

pub async fn export_metrics(State(state): State<AppState>) -> Json<Vec<MetricRecord>> {
    Json(state.monitoring.performance.export_metrics().await)
}

pub async fn get_request_metrics(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<Json<MetricRecord>, AppError> {
    state
        .monitoring
        .performance
        .find_by_request_id(&request_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Metric record {}", request_id)))
}

pub async fn reset_metrics(State(state): State<AppState>) -> StatusCode {
    state.monitoring.performance.reset().await;
    StatusCode::NO_CONTENT
}

use super::{
    handlers::{health, metrics},
    middleware::request_metrics::request_metrics_middleware,
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Router exposing only the monitoring surface
pub fn create_router(state: AppState) -> Router {
    create_app_router(Router::new(), state)
}

/// Mounts the monitoring surface next to `app_routes`.
///
/// Every request to `app_routes` is timed and recorded; the monitoring routes
/// themselves are not, so dashboards polling them do not skew the stats.
pub fn create_app_router(app_routes: Router<AppState>, state: AppState) -> Router {
    let app_routes = app_routes.layer(middleware::from_fn_with_state(
        state.clone(),
        request_metrics_middleware,
    ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/metrics/stats", get(metrics::get_stats))
        .route("/api/v1/metrics/export", get(metrics::export_metrics))
        .route(
            "/api/v1/metrics/requests/{request_id}",
            get(metrics::get_request_metrics),
        )
        .route("/api/v1/metrics/reset", post(metrics::reset_metrics))
        .merge(app_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

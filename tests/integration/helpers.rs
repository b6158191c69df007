use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Extension, Path},
    http::{Request, StatusCode},
    routing::get,
};
use perf_monitor::{
    config::Config,
    infrastructure::monitoring::MonitoringService,
    presentation::http::{
        middleware::request_metrics::RequestId, routes::create_app_router, state::AppState,
    },
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

pub struct TestApp {
    pub app: Router,
    pub monitoring: MonitoringService,
}

fn build_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_metrics: 100,
        slow_request_threshold_ms: 50,
        health_check_timeout_ms: 200,
        ..Config::default()
    }
}

/// Stand-in for the host application's routes
fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/items", get(list_items))
        .route("/api/v1/items/{id}", get(get_item))
        .route("/api/v1/slow", get(slow))
        .route("/api/v1/broken", get(broken))
}

async fn list_items(Extension(RequestId(request_id)): Extension<RequestId>) -> Json<Value> {
    Json(json!({ "items": ["a", "b"], "request_id": request_id }))
}

async fn get_item(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "id": id }))
}

async fn slow() -> StatusCode {
    tokio::time::sleep(Duration::from_millis(80)).await;
    StatusCode::OK
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn spawn_app() -> TestApp {
    let config = build_config();
    let monitoring = MonitoringService::from_config(&config);

    let state = AppState {
        monitoring: monitoring.clone(),
    };

    TestApp {
        app: create_app_router(app_routes(), state),
        monitoring,
    }
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn post_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn send(app: &Router, req: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(req).await.expect("request failed")
}

pub async fn read_json<T: DeserializeOwned>(res: axum::response::Response) -> T {
    let bytes = to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("failed to parse json")
}

pub async fn read_text(res: axum::response::Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("invalid utf8")
}

pub async fn expect_status(
    res: axum::response::Response,
    expected: StatusCode,
) -> axum::response::Response {
    let actual = res.status();

    if actual == expected {
        return res;
    }

    let body = read_text(res).await;
    panic!(
        "HTTP status mismatch. Expected {}, got {}. Response body: {}",
        expected, actual, body
    );
}

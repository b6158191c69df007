use super::helpers::{
    TestApp, expect_status, get_request, post_request, read_json, send, spawn_app,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::time::Duration;

async fn call(app: &TestApp, uri: &str) -> String {
    let res = send(&app.app, get_request(uri)).await;
    res.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("response should carry x-request-id")
        .to_string()
}

#[tokio::test]
async fn app_requests_are_recorded_under_their_request_id() {
    let app = spawn_app().await;

    let request_id = call(&app, "/api/v1/items/42").await;

    let uri = format!("/api/v1/metrics/requests/{}", request_id);
    let res = expect_status(send(&app.app, get_request(&uri)).await, StatusCode::OK).await;
    let record: Value = read_json(res).await;
    assert_eq!(record["request_id"], request_id.as_str());
    assert_eq!(record["url"], "/api/v1/items/42");
    assert_eq!(record["method"], "GET");
    assert_eq!(record["status_code"], 200);
}

#[tokio::test]
async fn incoming_request_id_is_propagated() {
    let app = spawn_app().await;

    let req = Request::builder()
        .method("GET")
        .uri("/api/v1/items")
        .header("x-request-id", "upstream-123")
        .body(Body::empty())
        .expect("failed to build request");
    let res = expect_status(send(&app.app, req).await, StatusCode::OK).await;
    assert_eq!(
        res.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("upstream-123")
    );
    let body: Value = read_json(res).await;
    assert_eq!(body["request_id"], "upstream-123");

    assert!(
        app.monitoring
            .performance
            .find_by_request_id("upstream-123")
            .await
            .is_some()
    );
}

#[tokio::test]
async fn stats_reflect_recorded_traffic() {
    let app = spawn_app().await;
    call(&app, "/api/v1/items").await;
    call(&app, "/api/v1/items").await;
    call(&app, "/api/v1/slow").await;
    call(&app, "/api/v1/broken").await;

    let res = expect_status(
        send(&app.app, get_request("/api/v1/metrics/stats")).await,
        StatusCode::OK,
    )
    .await;
    let stats: Value = read_json(res).await;

    assert_eq!(stats["total_requests"], 4);
    assert_eq!(stats["error_rate"], 0.25);
    assert!(stats["slow_requests"].as_u64().unwrap_or_default() >= 1);
    assert_eq!(stats["top_slow_endpoints"][0]["url"], "/api/v1/slow");
}

#[tokio::test]
async fn monitoring_routes_are_not_recorded() {
    let app = spawn_app().await;

    expect_status(send(&app.app, get_request("/api/v1/metrics/stats")).await, StatusCode::OK).await;
    expect_status(send(&app.app, get_request("/health")).await, StatusCode::OK).await;

    let res = expect_status(
        send(&app.app, get_request("/api/v1/metrics/export")).await,
        StatusCode::OK,
    )
    .await;
    let records: Vec<Value> = read_json(res).await;
    assert!(records.is_empty());
}

#[tokio::test]
async fn sub_events_reported_after_completion_are_attached() {
    let app = spawn_app().await;
    let request_id = call(&app, "/api/v1/items").await;

    let performance = &app.monitoring.performance;
    performance
        .record_database_query(
            &request_id,
            "SELECT * FROM items",
            Duration::from_millis(3),
            2,
            Some("items"),
            Some(true),
        )
        .await;
    performance
        .record_external_call(
            &request_id,
            "https://search.example.com",
            "POST",
            Duration::from_millis(20),
            503,
            false,
        )
        .await;

    let uri = format!("/api/v1/metrics/requests/{}", request_id);
    let res = send(&app.app, get_request(&uri)).await;
    let record: Value = read_json(expect_status(res, StatusCode::OK).await).await;
    assert_eq!(record["database_queries"][0]["table_name"], "items");
    assert_eq!(record["external_calls"][0]["success"], false);

    let res = send(&app.app, get_request("/api/v1/metrics/stats")).await;
    let stats: Value = read_json(expect_status(res, StatusCode::OK).await).await;
    assert_eq!(stats["total_database_queries"], 1);
    assert_eq!(stats["failed_external_calls"], 1);
}

#[tokio::test]
async fn unknown_request_id_returns_not_found() {
    let app = spawn_app().await;

    let res = expect_status(
        send(&app.app, get_request("/api/v1/metrics/requests/does-not-exist")).await,
        StatusCode::NOT_FOUND,
    )
    .await;
    let body: Value = read_json(res).await;
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|msg| msg.contains("does-not-exist"))
    );
}

#[tokio::test]
async fn zero_range_is_rejected() {
    let app = spawn_app().await;

    expect_status(
        send(&app.app, get_request("/api/v1/metrics/stats?range_ms=0")).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn range_limits_stats_to_recent_requests() {
    let app = spawn_app().await;
    call(&app, "/api/v1/items").await;

    let res = send(&app.app, get_request("/api/v1/metrics/stats?range_ms=60000")).await;
    let stats: Value = read_json(expect_status(res, StatusCode::OK).await).await;
    assert_eq!(stats["total_requests"], 1);
}

#[tokio::test]
async fn reset_clears_exported_metrics() {
    let app = spawn_app().await;
    call(&app, "/api/v1/items").await;
    call(&app, "/api/v1/broken").await;

    expect_status(
        send(&app.app, post_request("/api/v1/metrics/reset")).await,
        StatusCode::NO_CONTENT,
    )
    .await;

    let res = send(&app.app, get_request("/api/v1/metrics/export")).await;
    let records: Vec<Value> = read_json(expect_status(res, StatusCode::OK).await).await;
    assert!(records.is_empty());

    let res = send(&app.app, get_request("/api/v1/metrics/stats")).await;
    let stats: Value = read_json(expect_status(res, StatusCode::OK).await).await;
    assert_eq!(stats["total_requests"], 0);
    assert_eq!(stats["top_slow_endpoints"], serde_json::json!([]));
}

#[tokio::test]
async fn request_memory_comes_from_cached_sample() {
    let app = spawn_app().await;
    let cached = app.monitoring.sampler.refresh().await;

    let request_id = call(&app, "/api/v1/items").await;

    let record = app
        .monitoring
        .performance
        .find_by_request_id(&request_id)
        .await
        .expect("request should be recorded");
    let expected = cached.map_or(0, |s| s.memory_bytes);
    assert_eq!(record.memory_usage_bytes, expected);
}

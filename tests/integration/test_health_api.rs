use super::helpers::{expect_status, get_request, read_json, send, spawn_app};
use axum::http::StatusCode;
use perf_monitor::infrastructure::monitoring::ProbeReport;
use serde_json::Value;
use std::time::Duration;

#[tokio::test]
async fn health_without_checks_is_healthy() {
    let app = spawn_app().await;

    let res = expect_status(send(&app.app, get_request("/health")).await, StatusCode::OK).await;
    let body: Value = read_json(res).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["overall_score"], 100);
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn failing_probe_returns_service_unavailable() {
    let app = spawn_app().await;
    app.monitoring
        .health
        .add_health_check("database", || async {
            Err::<ProbeReport, _>(anyhow::anyhow!("connection refused"))
        })
        .await;
    app.monitoring
        .health
        .add_health_check("cache", || async { Ok(ProbeReport::pass()) })
        .await;

    let res = expect_status(
        send(&app.app, get_request("/health")).await,
        StatusCode::SERVICE_UNAVAILABLE,
    )
    .await;
    let body: Value = read_json(res).await;

    assert_eq!(body["status"], "unhealthy");
    assert!(body["overall_score"].as_u64().unwrap_or(100) < 100);
    let checks = body["checks"].as_array().expect("checks should be an array");
    assert_eq!(checks.len(), 2);
    assert!(
        checks
            .iter()
            .any(|c| c["name"] == "cache" && c["status"] == "pass")
    );
}

#[tokio::test]
async fn hung_probe_times_out_as_failure() {
    let app = spawn_app().await;
    app.monitoring
        .health
        .add_health_check("upstream", || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ProbeReport::pass())
        })
        .await;

    let res = expect_status(
        send(&app.app, get_request("/health")).await,
        StatusCode::SERVICE_UNAVAILABLE,
    )
    .await;
    let body: Value = read_json(res).await;
    assert_eq!(body["checks"][0]["status"], "fail");
}

#[tokio::test]
async fn warning_probe_is_degraded_but_available() {
    let app = spawn_app().await;
    app.monitoring
        .health
        .add_health_check("queue", || async { Ok(ProbeReport::warn("backlog growing")) })
        .await;

    let res = expect_status(send(&app.app, get_request("/health")).await, StatusCode::OK).await;
    let body: Value = read_json(res).await;

    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"][0]["message"], "backlog growing");
}

#[tokio::test]
async fn default_checks_are_reported() {
    let app = spawn_app().await;
    app.monitoring.register_default_checks(u64::MAX, u64::MAX).await;

    let res = send(&app.app, get_request("/health")).await;
    let body: Value = read_json(res).await;

    let names: Vec<&str> = body["checks"]
        .as_array()
        .expect("checks should be an array")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["performance", "memory"]);
}

use async_trait::async_trait;
use perf_monitor::infrastructure::monitoring::{
    CheckStatus, HealthCheck, HealthConfig, HealthRegistry, HealthStatus, ProbeReport,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn registry() -> HealthRegistry {
    HealthRegistry::new(HealthConfig {
        probe_timeout: Duration::from_millis(100),
        ..HealthConfig::default()
    })
}

struct HangingCheck;

#[async_trait]
impl HealthCheck for HangingCheck {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn check(&self) -> anyhow::Result<ProbeReport> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ProbeReport::pass())
    }
}

#[tokio::test]
async fn failing_probe_makes_system_unhealthy() {
    let registry = registry();
    registry
        .add_health_check("database", || async {
            Err::<ProbeReport, _>(anyhow::anyhow!("connection refused"))
        })
        .await;
    registry
        .add_health_check("cache", || async { Ok(ProbeReport::pass()) })
        .await;

    let health = registry.perform_health_check().await;

    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert!(health.overall_score < 100);

    let database = health
        .checks
        .iter()
        .find(|c| c.name == "database")
        .expect("database result");
    assert_eq!(database.status, CheckStatus::Fail);
    assert!(
        database.message.as_deref().unwrap_or_default().contains("connection refused"),
        "error text should be surfaced, got {:?}",
        database.message
    );
    let cache = health.checks.iter().find(|c| c.name == "cache").expect("cache result");
    assert_eq!(cache.status, CheckStatus::Pass);
}

#[tokio::test]
async fn timed_out_probe_does_not_block_others() {
    let registry = registry();
    registry.register(Arc::new(HangingCheck)).await;
    registry
        .add_health_check("fast", || async { Ok(ProbeReport::pass()) })
        .await;

    let started = Instant::now();
    let health = registry.perform_health_check().await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(health.checks.len(), 2);

    let hanging = health
        .checks
        .iter()
        .find(|c| c.name == "hanging")
        .expect("hanging result");
    assert_eq!(hanging.status, CheckStatus::Fail);
    let fast = health.checks.iter().find(|c| c.name == "fast").expect("fast result");
    assert_eq!(fast.status, CheckStatus::Pass);
}

#[tokio::test]
async fn warning_probe_degrades_status() {
    let registry = registry();
    registry
        .add_health_check("disk", || async { Ok(ProbeReport::warn("85% used")) })
        .await;
    registry
        .add_health_check("cache", || async { Ok(ProbeReport::pass()) })
        .await;

    let health = registry.perform_health_check().await;

    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(health.overall_score < 100);
    assert!(health.overall_score > 0);
}

#[tokio::test]
async fn fail_costs_more_than_warn() {
    let warn_only = registry();
    warn_only
        .add_health_check("a", || async { Ok(ProbeReport::warn("slow")) })
        .await;
    let fail_only = registry();
    fail_only
        .add_health_check("a", || async { Ok(ProbeReport::fail("down")) })
        .await;

    let warned = warn_only.perform_health_check().await.overall_score;
    let failed = fail_only.perform_health_check().await.overall_score;
    assert!(failed < warned);
}

#[tokio::test]
async fn score_floors_at_zero() {
    let registry = registry();
    for i in 0..10 {
        registry
            .add_health_check(format!("dep-{i}"), || async {
                Ok(ProbeReport::fail("down"))
            })
            .await;
    }

    let health = registry.perform_health_check().await;
    assert_eq!(health.overall_score, 0);
    assert_eq!(health.checks.len(), 10);
}

#[tokio::test]
async fn re_registering_a_name_replaces_the_probe() {
    let registry = registry();
    registry
        .add_health_check("database", || async { Ok(ProbeReport::fail("down")) })
        .await;
    registry
        .add_health_check("database", || async { Ok(ProbeReport::pass()) })
        .await;

    let health = registry.perform_health_check().await;

    assert_eq!(health.checks.len(), 1);
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.overall_score, 100);
}

#[tokio::test]
async fn every_run_re_executes_probes() {
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let registry = registry();
    let counter = calls.clone();
    registry
        .add_health_check("counter", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(ProbeReport::pass())
            }
        })
        .await;

    registry.perform_health_check().await;
    registry.perform_health_check().await;

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_registry_is_healthy() {
    let health = registry().perform_health_check().await;

    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.overall_score, 100);
    assert!(health.checks.is_empty());
}

//! Health check registry and concurrent runner.
//!
//! Probes are registered by name. [`HealthRegistry::perform_health_check`] runs
//! every probe as its own task under its own timeout, converts errors, panics
//! and timeouts into failing results, and reduces the results into one
//! [`SystemHealth`] verdict. Nothing is cached between runs.

pub mod checks;
pub mod types;

pub use checks::{MemoryHealthCheck, PerformanceHealthCheck};
pub use types::*;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, join_all};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Health check trait for monitoring service dependencies.
///
/// Returning `Err` marks the check as failing with the error text as message.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Returns the name of this health check for identification
    fn name(&self) -> &str;

    /// Performs the health check and returns the current status
    async fn check(&self) -> anyhow::Result<ProbeReport>;

    /// Overrides the registry-wide timeout for this check
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Why a probe was converted into a failing result
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Failed(String),

    #[error("health check timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("health check panicked: {0}")]
    Panicked(String),

    #[error("health check was cancelled")]
    Cancelled,
}

type ProbeFn = dyn Fn() -> BoxFuture<'static, anyhow::Result<ProbeReport>> + Send + Sync;

/// Adapts a closure returning a future into a [`HealthCheck`]
struct FnHealthCheck {
    name: String,
    probe: Box<ProbeFn>,
}

#[async_trait]
impl HealthCheck for FnHealthCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> anyhow::Result<ProbeReport> {
        (self.probe)().await
    }
}

/// Named probes plus the policy used to run them
pub struct HealthRegistry {
    checks: RwLock<Vec<Arc<dyn HealthCheck>>>,
    config: HealthConfig,
}

impl HealthRegistry {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            checks: RwLock::new(Vec::new()),
            config,
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Registers a check, replacing any existing check with the same name
    pub async fn register(&self, check: Arc<dyn HealthCheck>) {
        let mut checks = self.checks.write().await;
        match checks.iter_mut().find(|c| c.name() == check.name()) {
            Some(slot) => {
                debug!(check = check.name(), "Replacing health check");
                *slot = check;
            }
            None => {
                debug!(check = check.name(), "Registering health check");
                checks.push(check);
            }
        }
    }

    /// Registers an async closure as a named probe
    pub async fn add_health_check<F, Fut>(&self, name: impl Into<String>, probe: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ProbeReport>> + Send + 'static,
    {
        let probe =
            move || -> BoxFuture<'static, anyhow::Result<ProbeReport>> { Box::pin(probe()) };
        self.register(Arc::new(FnHealthCheck {
            name: name.into(),
            probe: Box::new(probe),
        }))
        .await;
    }

    /// Unregisters a check, returning whether it existed
    pub async fn remove_health_check(&self, name: &str) -> bool {
        let mut checks = self.checks.write().await;
        let before = checks.len();
        checks.retain(|c| c.name() != name);
        checks.len() != before
    }

    /// Registered check names in registration order
    pub async fn names(&self) -> Vec<String> {
        self.checks
            .read()
            .await
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.checks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.checks.read().await.is_empty()
    }

    /// Runs every registered probe concurrently and reduces the results
    pub async fn perform_health_check(&self) -> SystemHealth {
        let checks: Vec<Arc<dyn HealthCheck>> = self.checks.read().await.clone();

        let runs = checks.into_iter().map(|check| {
            let limit = check.timeout().unwrap_or(self.config.probe_timeout);
            run_probe(check, limit)
        });
        let results = join_all(runs).await;

        let health = summarize(results, &self.config);
        info!(
            status = ?health.status,
            score = health.overall_score,
            checks = health.checks.len(),
            "Health check completed"
        );
        health
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

/// Runs one probe in its own task; the task is aborted once `limit` elapses.
async fn run_probe(check: Arc<dyn HealthCheck>, limit: Duration) -> HealthCheckResult {
    let name = check.name().to_string();
    let start_time = Instant::now();

    let mut task = tokio::spawn(async move { check.check().await });
    let outcome = match tokio::time::timeout(limit, &mut task).await {
        Ok(Ok(Ok(report))) => Ok(report),
        Ok(Ok(Err(err))) => Err(ProbeError::Failed(format!("{err:#}"))),
        Ok(Err(join_err)) if join_err.is_panic() => {
            Err(ProbeError::Panicked(panic_message(join_err.into_panic())))
        }
        Ok(Err(_)) => Err(ProbeError::Cancelled),
        Err(_) => {
            task.abort();
            Err(ProbeError::TimedOut(limit))
        }
    };
    let response_time_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(report) => HealthCheckResult {
            name,
            status: report.status,
            response_time_ms,
            message: report.message,
            details: report.details,
        },
        Err(err) => {
            warn!(check = %name, error = %err, "Health check failed");
            HealthCheckResult {
                name,
                status: CheckStatus::Fail,
                response_time_ms,
                message: Some(err.to_string()),
                details: None,
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Derives the aggregate status and score from individual results
fn summarize(checks: Vec<HealthCheckResult>, config: &HealthConfig) -> SystemHealth {
    let fails = checks.iter().filter(|c| c.status == CheckStatus::Fail).count();
    let warns = checks.iter().filter(|c| c.status == CheckStatus::Warn).count();

    let status = if fails > 0 {
        HealthStatus::Unhealthy
    } else if warns > 0 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let (fail_penalty, warn_penalty) = config.effective_penalties();
    let penalty = fails
        .saturating_mul(fail_penalty as usize)
        .saturating_add(warns.saturating_mul(warn_penalty as usize));
    let overall_score = 100usize.saturating_sub(penalty) as u8;

    SystemHealth {
        status,
        timestamp: chrono::Utc::now(),
        checks,
        overall_score,
    }
}

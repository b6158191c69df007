//! Built-in probes over the monitor's own data and the host process.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::{HealthCheck, ProbeReport};
use crate::infrastructure::monitoring::performance::PerformanceMonitor;
use crate::infrastructure::monitoring::system::ProcessSampler;

/// Judges recent traffic by error rate and mean latency
pub struct PerformanceHealthCheck {
    monitor: Arc<PerformanceMonitor>,
    window: Duration,
    error_rate_warn: f64,
    error_rate_fail: f64,
    response_time_warn_ms: f64,
    response_time_fail_ms: f64,
}

impl PerformanceHealthCheck {
    pub fn new(monitor: Arc<PerformanceMonitor>) -> Self {
        Self {
            monitor,
            window: Duration::from_secs(5 * 60),
            error_rate_warn: 0.05,
            error_rate_fail: 0.10,
            response_time_warn_ms: 2000.0,
            response_time_fail_ms: 5000.0,
        }
    }

    /// Only requests newer than `window` are considered
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_error_rate_thresholds(mut self, warn: f64, fail: f64) -> Self {
        self.error_rate_warn = warn;
        self.error_rate_fail = fail;
        self
    }

    pub fn with_response_time_thresholds(mut self, warn_ms: f64, fail_ms: f64) -> Self {
        self.response_time_warn_ms = warn_ms;
        self.response_time_fail_ms = fail_ms;
        self
    }
}

#[async_trait]
impl HealthCheck for PerformanceHealthCheck {
    fn name(&self) -> &str {
        "performance"
    }

    async fn check(&self) -> anyhow::Result<ProbeReport> {
        let stats = self.monitor.get_performance_stats(Some(self.window)).await;
        let details = json!({
            "window_seconds": self.window.as_secs(),
            "total_requests": stats.total_requests,
            "error_rate": stats.error_rate,
            "average_response_time": stats.average_response_time,
            "p95_response_time": stats.p95_response_time,
            "slow_requests": stats.slow_requests,
        });

        let report = if stats.error_rate > self.error_rate_fail {
            ProbeReport::fail(format!("Error rate at {:.1}%", stats.error_rate * 100.0))
        } else if stats.average_response_time > self.response_time_fail_ms {
            ProbeReport::fail(format!(
                "Average response time at {:.0}ms",
                stats.average_response_time
            ))
        } else if stats.error_rate > self.error_rate_warn {
            ProbeReport::warn(format!("Error rate at {:.1}%", stats.error_rate * 100.0))
        } else if stats.average_response_time > self.response_time_warn_ms {
            ProbeReport::warn(format!(
                "Average response time at {:.0}ms",
                stats.average_response_time
            ))
        } else {
            ProbeReport::pass()
                .with_message(format!("{} requests in window", stats.total_requests))
        };

        Ok(report.with_details(details))
    }
}

/// Judges the resident memory of the current process
pub struct MemoryHealthCheck {
    sampler: Arc<ProcessSampler>,
    warn_bytes: u64,
    fail_bytes: u64,
}

impl MemoryHealthCheck {
    pub fn new(sampler: Arc<ProcessSampler>, warn_bytes: u64, fail_bytes: u64) -> Self {
        Self {
            sampler,
            warn_bytes,
            fail_bytes: fail_bytes.max(warn_bytes),
        }
    }
}

#[async_trait]
impl HealthCheck for MemoryHealthCheck {
    fn name(&self) -> &str {
        "memory"
    }

    async fn check(&self) -> anyhow::Result<ProbeReport> {
        let Some(sample) = self.sampler.refresh().await else {
            return Ok(ProbeReport::warn("Process memory unavailable"));
        };

        let used_mb = sample.memory_bytes as f64 / 1_048_576.0;
        let details = json!({
            "memory_bytes": sample.memory_bytes,
            "cpu_usage": sample.cpu_usage,
            "warn_bytes": self.warn_bytes,
            "fail_bytes": self.fail_bytes,
        });

        let report = if sample.memory_bytes > self.fail_bytes {
            ProbeReport::fail(format!("Memory usage at {:.1}MB", used_mb))
        } else if sample.memory_bytes > self.warn_bytes {
            ProbeReport::warn(format!("Memory usage at {:.1}MB", used_mb))
        } else {
            ProbeReport::pass().with_message(format!("Memory usage at {:.1}MB", used_mb))
        };

        Ok(report.with_details(details))
    }
}

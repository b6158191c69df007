//! Monitoring and observability infrastructure.
//!
//! This module provides:
//! - Request-level performance records with correlated sub-events
//! - Windowed statistics and threshold alerting
//! - A registry of asynchronous health probes with an aggregate verdict
//! - Resource sampling for the running process
//!
//! Everything lives in process memory for the lifetime of the service.

pub mod health;
pub mod performance;
pub mod system;

pub use health::{
    CheckStatus, HealthCheck, HealthCheckResult, HealthConfig, HealthRegistry, HealthStatus,
    MemoryHealthCheck, PerformanceHealthCheck, ProbeReport, SystemHealth,
};
pub use performance::{
    Alert, AlertKind, AlertSeverity, AlertSink, EndpointStats, MetricRecord, MonitorConfig,
    PerformanceMonitor, PerformanceStats, TracingAlertSink,
};
pub use system::{ProcessSample, ProcessSampler};

use std::sync::Arc;

use crate::config::Config;

/// Centralized monitoring coordinator that owns all observability components.
///
/// Built once by the composition root and shared through application state.
#[derive(Clone)]
pub struct MonitoringService {
    /// Request metrics and aggregation
    pub performance: Arc<PerformanceMonitor>,

    /// Health check registry for service dependencies
    pub health: Arc<HealthRegistry>,

    /// Process resource sampler shared by middleware and probes
    pub sampler: Arc<ProcessSampler>,
}

impl MonitoringService {
    /// Creates a monitoring service with default configuration
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default(), HealthConfig::default())
    }

    pub fn with_config(monitor: MonitorConfig, health: HealthConfig) -> Self {
        Self {
            performance: Arc::new(PerformanceMonitor::with_config(monitor)),
            health: Arc::new(HealthRegistry::new(health)),
            sampler: Arc::new(ProcessSampler::new()),
        }
    }

    /// Creates a monitoring service from application configuration
    pub fn from_config(config: &Config) -> Self {
        Self::with_config(config.monitor_config(), config.health_config())
    }

    /// Registers the built-in performance and memory probes
    pub async fn register_default_checks(&self, memory_warn_bytes: u64, memory_fail_bytes: u64) {
        self.health
            .register(Arc::new(PerformanceHealthCheck::new(self.performance.clone())))
            .await;
        self.health
            .register(Arc::new(MemoryHealthCheck::new(
                self.sampler.clone(),
                memory_warn_bytes,
                memory_fail_bytes,
            )))
            .await;
    }
}

impl Default for MonitoringService {
    fn default() -> Self {
        Self::new()
    }
}

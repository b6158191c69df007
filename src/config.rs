//! Application configuration loading from environment variables.
//!
//! All configuration is loaded from the environment at startup via standard `std::env::var`,
//! after an optional `.env` file has been applied with `dotenvy`.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (default: "info,perf_monitor=debug,tower_http=debug")
//! - `HOST`: Server bind address (default: "0.0.0.0")
//! - `PORT`: Server port (default: 3000)
//! - `MAX_METRICS`: Request records retained before FIFO eviction (default: 10000)
//! - `SLOW_REQUEST_THRESHOLD_MS`: Slow request threshold (default: 1000)
//! - `SLOW_QUERY_THRESHOLD_MS`: Slow query threshold (default: 1000)
//! - `HIGH_MEMORY_THRESHOLD_MB`: Per-request memory alert threshold (default: 512)
//! - `TOP_ENDPOINTS_LIMIT`: Endpoints in the slowest ranking (default: 10)
//! - `ERROR_SPIKE_THRESHOLD`: Errors per window that raise a spike alert (default: 10)
//! - `ERROR_SPIKE_WINDOW_SECONDS`: Spike detection window (default: 60)
//! - `METRICS_RETENTION_MINUTES`: Maximum record age, 0 disables (default: 60)
//! - `PRUNE_EVERY_INSERTS`: Inserts between age-based prunes (default: 100)
//! - `PRUNE_INTERVAL_SECONDS`: Background pruning interval (default: 300)
//! - `PROCESS_SAMPLE_INTERVAL_MS`: Process memory/CPU sampling interval (default: 1000)
//! - `HEALTH_CHECK_TIMEOUT_MS`: Default per-probe timeout (default: 5000)
//! - `HEALTH_FAIL_PENALTY`: Score deducted per failing probe (default: 30)
//! - `HEALTH_WARN_PENALTY`: Score deducted per warning probe (default: 10)
//! - `MEMORY_WARN_MB`: Memory probe warning threshold (default: 768)
//! - `MEMORY_FAIL_MB`: Memory probe failure threshold (default: 1024)

use std::time::Duration;

use crate::infrastructure::monitoring::{HealthConfig, MonitorConfig};

const MB: u64 = 1024 * 1024;

/// Complete server configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    pub max_metrics: usize,
    pub slow_request_threshold_ms: u64,
    pub slow_query_threshold_ms: u64,
    pub high_memory_threshold_mb: u64,
    pub top_endpoints_limit: usize,
    pub error_spike_threshold: usize,
    pub error_spike_window_seconds: u64,

    /// Maximum record age in minutes, 0 keeps records until evicted by count
    pub metrics_retention_minutes: u64,

    pub prune_every_inserts: usize,

    /// Interval in seconds for the background pruning worker
    pub prune_interval_seconds: u64,

    /// Interval in milliseconds between process resource samples
    pub process_sample_interval_ms: u64,

    pub health_check_timeout_ms: u64,
    pub health_fail_penalty: u8,
    pub health_warn_penalty: u8,
    pub memory_warn_mb: u64,
    pub memory_fail_mb: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed to the expected type,
    /// or if the values fail [`Config::validate`].
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            host: env_or("HOST", "0.0.0.0".to_string())?,
            port: env_or("PORT", 3000)?,
            max_metrics: env_or("MAX_METRICS", 10_000)?,
            slow_request_threshold_ms: env_or("SLOW_REQUEST_THRESHOLD_MS", 1000)?,
            slow_query_threshold_ms: env_or("SLOW_QUERY_THRESHOLD_MS", 1000)?,
            high_memory_threshold_mb: env_or("HIGH_MEMORY_THRESHOLD_MB", 512)?,
            top_endpoints_limit: env_or("TOP_ENDPOINTS_LIMIT", 10)?,
            error_spike_threshold: env_or("ERROR_SPIKE_THRESHOLD", 10)?,
            error_spike_window_seconds: env_or("ERROR_SPIKE_WINDOW_SECONDS", 60)?,
            metrics_retention_minutes: env_or("METRICS_RETENTION_MINUTES", 60)?,
            prune_every_inserts: env_or("PRUNE_EVERY_INSERTS", 100)?,
            prune_interval_seconds: env_or("PRUNE_INTERVAL_SECONDS", 300)?,
            process_sample_interval_ms: env_or("PROCESS_SAMPLE_INTERVAL_MS", 1000)?,
            health_check_timeout_ms: env_or("HEALTH_CHECK_TIMEOUT_MS", 5000)?,
            health_fail_penalty: env_or("HEALTH_FAIL_PENALTY", 30)?,
            health_warn_penalty: env_or("HEALTH_WARN_PENALTY", 10)?,
            memory_warn_mb: env_or("MEMORY_WARN_MB", 768)?,
            memory_fail_mb: env_or("MEMORY_FAIL_MB", 1024)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make the health score meaningless.
    ///
    /// # Errors
    ///
    /// Returns an error unless `1 <= HEALTH_WARN_PENALTY < HEALTH_FAIL_PENALTY`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.health_warn_penalty == 0 {
            anyhow::bail!("HEALTH_WARN_PENALTY must be at least 1");
        }
        if self.health_fail_penalty <= self.health_warn_penalty {
            anyhow::bail!(
                "HEALTH_FAIL_PENALTY ({}) must be greater than HEALTH_WARN_PENALTY ({})",
                self.health_fail_penalty,
                self.health_warn_penalty
            );
        }
        Ok(())
    }

    /// Performance monitor settings derived from this configuration
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            max_metrics: self.max_metrics,
            slow_request_threshold_ms: self.slow_request_threshold_ms,
            slow_query_threshold_ms: self.slow_query_threshold_ms,
            high_memory_threshold_bytes: self.high_memory_threshold_mb.saturating_mul(MB),
            top_endpoints_limit: self.top_endpoints_limit,
            error_spike_threshold: self.error_spike_threshold,
            error_spike_window: Duration::from_secs(self.error_spike_window_seconds),
            retention: (self.metrics_retention_minutes > 0)
                .then(|| Duration::from_secs(self.metrics_retention_minutes.saturating_mul(60))),
            prune_every_inserts: self.prune_every_inserts,
        }
    }

    /// Health runner settings derived from this configuration
    pub fn health_config(&self) -> HealthConfig {
        HealthConfig {
            probe_timeout: Duration::from_millis(self.health_check_timeout_ms),
            fail_penalty: self.health_fail_penalty,
            warn_penalty: self.health_warn_penalty,
        }
    }

    pub fn memory_warn_bytes(&self) -> u64 {
        self.memory_warn_mb.saturating_mul(MB)
    }

    pub fn memory_fail_bytes(&self) -> u64 {
        self.memory_fail_mb.saturating_mul(MB)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_metrics: 10_000,
            slow_request_threshold_ms: 1000,
            slow_query_threshold_ms: 1000,
            high_memory_threshold_mb: 512,
            top_endpoints_limit: 10,
            error_spike_threshold: 10,
            error_spike_window_seconds: 60,
            metrics_retention_minutes: 60,
            prune_every_inserts: 100,
            prune_interval_seconds: 300,
            process_sample_interval_ms: 1000,
            health_check_timeout_ms: 5000,
            health_fail_penalty: 30,
            health_warn_penalty: 10,
            memory_warn_mb: 768,
            memory_fail_mb: 1024,
        }
    }
}

/// Load an environment variable with a default value.
///
/// Returns the parsed environment variable if set, otherwise returns the default.
///
/// # Errors
///
/// Returns an error if the variable is set but cannot be parsed.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

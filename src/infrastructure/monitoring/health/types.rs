//! Health check result and status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a single probe
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Aggregate service health
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// What a probe reports; the runner adds the name and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub status: CheckStatus,
    pub message: Option<String>,
    /// Probe-specific payload, only ever rendered
    pub details: Option<serde_json::Value>,
}

impl ProbeReport {
    pub fn pass() -> Self {
        Self {
            status: CheckStatus::Pass,
            message: None,
            details: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Warn,
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Result of a health check operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub response_time_ms: u64,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// Snapshot produced by one run of every registered probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub checks: Vec<HealthCheckResult>,
    /// 0 to 100, lowered by every failing or warning check
    pub overall_score: u8,
}

/// Runner settings
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Applied to probes that do not declare their own timeout
    pub probe_timeout: Duration,
    /// Score deducted per failing check
    pub fail_penalty: u8,
    /// Score deducted per warning check
    pub warn_penalty: u8,
}

impl HealthConfig {
    /// Penalties as applied by the runner: `(fail, warn)` with
    /// `fail > warn >= 1`, so every failing or warning check lowers the score
    /// and a failure always costs more than a warning.
    pub fn effective_penalties(&self) -> (u8, u8) {
        let fail = self.fail_penalty.max(2);
        let warn = self.warn_penalty.clamp(1, fail - 1);
        (fail, warn)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            fail_penalty: 30,
            warn_penalty: 10,
        }
    }
}

//! Metric types and data structures for performance monitoring.
//!
//! A [`MetricRecord`] is the unit of storage: one per request, owning the
//! database queries, external calls and errors attributed to that request.
//! [`PerformanceStats`] and [`EndpointStats`] are the derived summaries handed
//! to dashboards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ===== Metric Collection Types =====

/// Request-level performance record, correlated by `request_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Correlation key shared with every sub-event of the request
    pub request_id: String,
    /// When the record was created
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub method: String,
    pub status_code: u16,
    pub response_time_ms: u64,
    /// Process memory snapshot taken when the request completed
    pub memory_usage_bytes: u64,
    pub cpu_usage: Option<f64>,
    pub database_queries: Vec<DatabaseQueryMetric>,
    pub external_calls: Vec<ExternalCallMetric>,
    pub errors: Vec<ErrorMetric>,
}

impl MetricRecord {
    /// Creates a record stamped with the current time and no sub-events
    pub fn new(
        request_id: impl Into<String>,
        url: impl Into<String>,
        method: impl Into<String>,
        status_code: u16,
        response_time_ms: u64,
        memory_usage_bytes: u64,
        cpu_usage: Option<f64>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            url: url.into(),
            method: method.into(),
            status_code,
            response_time_ms,
            memory_usage_bytes,
            cpu_usage,
            database_queries: Vec::new(),
            external_calls: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Overrides the creation time, used when replaying or backfilling records
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// A request counts as errored if it carries errors or ended in a 5xx
    pub fn is_error(&self) -> bool {
        !self.errors.is_empty() || self.status_code >= 500
    }
}

/// Database query executed while serving a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseQueryMetric {
    pub query: String,
    pub execution_time_ms: u64,
    pub row_count: u64,
    pub table_name: Option<String>,
    pub index_used: Option<bool>,
}

/// Outbound call made while serving a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalCallMetric {
    pub url: String,
    pub method: String,
    pub response_time_ms: u64,
    pub status_code: u16,
    pub success: bool,
}

/// Error raised while serving a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetric {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub stack: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ===== Summary Types for Export =====

/// Windowed performance summary for dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_requests: usize,
    pub average_response_time: f64,
    pub error_rate: f64,
    pub slow_requests: usize,
    pub top_slow_endpoints: Vec<EndpointStats>,
    pub p50_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
    pub total_database_queries: usize,
    pub slow_database_queries: usize,
    pub failed_external_calls: usize,
}

impl PerformanceStats {
    /// All-zero summary returned when no records fall in the window
    pub fn empty() -> Self {
        Self {
            total_requests: 0,
            average_response_time: 0.0,
            error_rate: 0.0,
            slow_requests: 0,
            top_slow_endpoints: Vec::new(),
            p50_response_time: 0.0,
            p95_response_time: 0.0,
            p99_response_time: 0.0,
            total_database_queries: 0,
            slow_database_queries: 0,
            failed_external_calls: 0,
        }
    }
}

/// Per-url latency summary used in the slowest endpoint ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointStats {
    pub url: String,
    pub average_response_time: f64,
    pub count: usize,
}

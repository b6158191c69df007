//! Configuration for the performance monitoring system.

use std::time::Duration;

/// Configuration for metric retention and alert thresholds
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Maximum request records retained before FIFO eviction
    pub max_metrics: usize,

    /// Requests slower than this count as slow in stats and raise alerts
    pub slow_request_threshold_ms: u64,

    /// Slow query threshold in milliseconds
    pub slow_query_threshold_ms: u64,

    /// Memory snapshot above which a request raises a high memory alert
    pub high_memory_threshold_bytes: u64,

    /// Number of endpoints returned in the slowest endpoint ranking
    pub top_endpoints_limit: usize,

    /// Errors within `error_spike_window` that constitute a spike
    pub error_spike_threshold: usize,

    /// Sliding window used for error spike detection
    pub error_spike_window: Duration,

    /// Maximum record age, `None` keeps records until evicted by count
    pub retention: Option<Duration>,

    /// Age-based pruning runs once every this many request inserts
    pub prune_every_inserts: usize,
}

impl MonitorConfig {
    /// Checks if a response time counts as a slow request
    pub fn is_slow_request(&self, response_time_ms: u64) -> bool {
        response_time_ms > self.slow_request_threshold_ms
    }

    /// Checks if a query execution time counts as a slow query
    pub fn is_slow_query(&self, execution_time_ms: u64) -> bool {
        execution_time_ms > self.slow_query_threshold_ms
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_metrics: 10_000,
            slow_request_threshold_ms: 1000,
            slow_query_threshold_ms: 1000,
            high_memory_threshold_bytes: 512 * 1024 * 1024,
            top_endpoints_limit: 10,
            error_spike_threshold: 10,
            error_spike_window: Duration::from_secs(60),
            retention: Some(Duration::from_secs(60 * 60)),
            prune_every_inserts: 100,
        }
    }
}

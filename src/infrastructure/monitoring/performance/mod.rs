//! Performance monitoring service for production observability.
//!
//! Ingests request, database query, external call and error events correlated
//! by request id, keeps them in a bounded FIFO store and computes windowed
//! statistics on demand. Threshold checks run on the recording path and feed an
//! [`AlertSink`].

pub mod alerts;
pub mod config;
pub mod store;
pub mod types;

pub use alerts::{Alert, AlertKind, AlertSeverity, AlertSink, TracingAlertSink};
pub use config::MonitorConfig;
pub use store::{AppendOutcome, MetricStore};
pub use types::*;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use alerts::ErrorSpikeTracker;

/// Internal monitoring state guarded by a single lock
pub struct MonitorInner {
    /// Request records with their nested sub-events
    pub store: MetricStore,
    /// Recent error timestamps for spike detection
    error_spikes: ErrorSpikeTracker,
    /// Request inserts since the last age-based prune
    inserts_since_prune: usize,
}

/// In-process performance monitor.
///
/// Owned by the composition root and shared behind an `Arc`. Every operation
/// is an in-memory mutation or read under one `RwLock`; none of them fail.
/// Sub-events for a request id that is not (or no longer) stored are dropped.
pub struct PerformanceMonitor {
    /// Thread-safe storage for metric records
    pub(crate) inner: Arc<RwLock<MonitorInner>>,

    /// Configuration for monitoring behavior
    config: MonitorConfig,

    /// Receives threshold alerts
    alert_sink: Arc<dyn AlertSink>,

    /// Sub-events dropped because their request was not found
    correlation_misses: AtomicU64,
}

impl PerformanceMonitor {
    /// Creates a new performance monitor with default configuration
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    /// Creates a performance monitor with custom configuration
    pub fn with_config(config: MonitorConfig) -> Self {
        Self::with_alert_sink(config, Arc::new(TracingAlertSink))
    }

    /// Creates a performance monitor that reports threshold alerts to `alert_sink`
    pub fn with_alert_sink(config: MonitorConfig, alert_sink: Arc<dyn AlertSink>) -> Self {
        info!("Initializing PerformanceMonitor with configuration: {:?}", config);

        Self {
            inner: Arc::new(RwLock::new(MonitorInner {
                store: MetricStore::new(config.max_metrics),
                error_spikes: ErrorSpikeTracker::default(),
                inserts_since_prune: 0,
            })),
            config,
            alert_sink,
            correlation_misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Records a completed request, replacing any record with the same id
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self), fields(duration_ms = response_time.as_millis() as u64))]
    pub async fn record_request(
        &self,
        request_id: &str,
        url: &str,
        method: &str,
        status_code: u16,
        response_time: Duration,
        memory_usage_bytes: u64,
        cpu_usage: Option<f64>,
    ) {
        let record = MetricRecord::new(
            request_id,
            url,
            method,
            status_code,
            duration_ms(response_time),
            memory_usage_bytes,
            cpu_usage,
        );
        let alerts = self.check_performance_thresholds(&record);

        {
            let mut inner = self.inner.write().await;
            let outcome = inner.store.append(record);
            if outcome.replaced {
                debug!(request_id, "Duplicate request id, previous record replaced");
            }
            if outcome.evicted > 0 {
                debug!(evicted = outcome.evicted, "Evicted oldest metric records");
            }

            inner.inserts_since_prune += 1;
            if inner.inserts_since_prune >= self.config.prune_every_inserts.max(1) {
                inner.inserts_since_prune = 0;
                if let Some(retention) = self.config.retention {
                    let removed = inner.store.prune(cutoff(Utc::now(), retention));
                    if removed > 0 {
                        debug!(removed, "Pruned expired metric records");
                    }
                }
            }
        }

        alerts::dispatch(self.alert_sink.as_ref(), alerts);
    }

    /// Attaches a database query to its request
    #[instrument(skip(self, query), fields(duration_ms = execution_time.as_millis() as u64))]
    pub async fn record_database_query(
        &self,
        request_id: &str,
        query: &str,
        execution_time: Duration,
        row_count: u64,
        table_name: Option<&str>,
        index_used: Option<bool>,
    ) {
        let execution_time_ms = duration_ms(execution_time);
        let attached = {
            let mut inner = self.inner.write().await;
            match inner.store.find_mut(request_id) {
                Some(record) => {
                    record.database_queries.push(DatabaseQueryMetric {
                        query: query.to_string(),
                        execution_time_ms,
                        row_count,
                        table_name: table_name.map(str::to_string),
                        index_used,
                    });
                    true
                }
                None => false,
            }
        };

        if !attached {
            self.note_correlation_miss(request_id, "database_query");
            return;
        }

        if self.config.is_slow_query(execution_time_ms) {
            let alert = Alert::new(
                AlertKind::SlowQuery,
                AlertSeverity::Warning,
                request_id,
                format!(
                    "Slow query on {} took {}ms",
                    table_name.unwrap_or("unknown table"),
                    execution_time_ms
                ),
                self.config.slow_query_threshold_ms as f64,
                execution_time_ms as f64,
            );
            alerts::dispatch(self.alert_sink.as_ref(), vec![alert]);
        }
    }

    /// Attaches an outbound call to its request
    #[instrument(skip(self), fields(duration_ms = response_time.as_millis() as u64))]
    pub async fn record_external_call(
        &self,
        request_id: &str,
        url: &str,
        method: &str,
        response_time: Duration,
        status_code: u16,
        success: bool,
    ) {
        let attached = {
            let mut inner = self.inner.write().await;
            match inner.store.find_mut(request_id) {
                Some(record) => {
                    record.external_calls.push(ExternalCallMetric {
                        url: url.to_string(),
                        method: method.to_string(),
                        response_time_ms: duration_ms(response_time),
                        status_code,
                        success,
                    });
                    true
                }
                None => false,
            }
        };

        if !attached {
            self.note_correlation_miss(request_id, "external_call");
        }
    }

    /// Attaches an error to its request and runs error threshold checks
    #[instrument(skip(self, message, stack))]
    pub async fn record_error(
        &self,
        request_id: &str,
        error_type: &str,
        message: &str,
        stack: Option<&str>,
    ) {
        let now = Utc::now();
        let spike = {
            let mut inner = self.inner.write().await;
            match inner.store.find_mut(request_id) {
                Some(record) => {
                    record.errors.push(ErrorMetric {
                        error_type: error_type.to_string(),
                        message: message.to_string(),
                        stack: stack.map(str::to_string),
                        timestamp: now,
                    });
                    Some(inner.error_spikes.observe(
                        now,
                        self.config.error_spike_window,
                        self.config.error_spike_threshold,
                    ))
                }
                None => None,
            }
        };

        let Some(spike) = spike else {
            self.note_correlation_miss(request_id, "error");
            return;
        };

        let mut raised = vec![Alert::new(
            AlertKind::RequestError,
            AlertSeverity::Warning,
            request_id,
            format!("{}: {}", error_type, message),
            0.0,
            1.0,
        )];
        if let Some(recent_errors) = spike {
            raised.push(Alert::new(
                AlertKind::ErrorSpike,
                AlertSeverity::Critical,
                request_id,
                format!(
                    "{} errors within {}s",
                    recent_errors,
                    self.config.error_spike_window.as_secs()
                ),
                self.config.error_spike_threshold as f64,
                recent_errors as f64,
            ));
        }
        alerts::dispatch(self.alert_sink.as_ref(), raised);
    }

    /// Computes summary statistics over records newer than `time_range`, or all records
    pub async fn get_performance_stats(&self, time_range: Option<Duration>) -> PerformanceStats {
        let since = time_range.map(|range| cutoff(Utc::now(), range));
        let inner = self.inner.read().await;
        Self::calculate_stats(inner.store.iter(), since, &self.config)
    }

    /// Looks up a single record by its correlation key
    pub async fn find_by_request_id(&self, request_id: &str) -> Option<MetricRecord> {
        self.inner.read().await.store.find(request_id).cloned()
    }

    /// Returns an owned copy of every stored record, oldest first
    pub async fn export_metrics(&self) -> Vec<MetricRecord> {
        self.inner.read().await.store.iter().cloned().collect()
    }

    /// Clears all records and threshold tracking state
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.store.clear();
        inner.error_spikes.clear();
        inner.inserts_since_prune = 0;
        self.correlation_misses.store(0, Ordering::Relaxed);
        info!("Performance metrics reset");
    }

    /// Number of records currently stored
    pub async fn len(&self) -> usize {
        self.inner.read().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.store.is_empty()
    }

    /// Sub-events dropped since the last reset because their request was unknown
    pub fn correlation_misses(&self) -> u64 {
        self.correlation_misses.load(Ordering::Relaxed)
    }

    /// Removes records older than `max_age`, returning how many were dropped
    pub async fn prune_older_than(&self, max_age: Duration) -> usize {
        let mut inner = self.inner.write().await;
        inner.store.prune(cutoff(Utc::now(), max_age))
    }

    /// Applies the configured retention, if any
    pub async fn cleanup_old_metrics(&self) -> usize {
        let Some(retention) = self.config.retention else {
            return 0;
        };

        let removed = self.prune_older_than(retention).await;
        debug!(removed, "Completed automatic cleanup of old metrics");
        removed
    }

    // ===== Internal Calculation Methods =====

    fn note_correlation_miss(&self, request_id: &str, event: &str) {
        self.correlation_misses.fetch_add(1, Ordering::Relaxed);
        debug!(request_id, event, "No metric record for request, event dropped");
    }

    /// Compares a freshly built record against the configured thresholds
    fn check_performance_thresholds(&self, record: &MetricRecord) -> Vec<Alert> {
        let mut raised = Vec::new();

        if self.config.is_slow_request(record.response_time_ms) {
            raised.push(Alert::new(
                AlertKind::SlowRequest,
                AlertSeverity::Warning,
                &record.request_id,
                format!(
                    "{} {} took {}ms",
                    record.method, record.url, record.response_time_ms
                ),
                self.config.slow_request_threshold_ms as f64,
                record.response_time_ms as f64,
            ));
        }

        if record.memory_usage_bytes > self.config.high_memory_threshold_bytes {
            raised.push(Alert::new(
                AlertKind::HighMemory,
                AlertSeverity::Warning,
                &record.request_id,
                format!(
                    "Memory usage at {:.1}MB",
                    record.memory_usage_bytes as f64 / 1_048_576.0
                ),
                self.config.high_memory_threshold_bytes as f64,
                record.memory_usage_bytes as f64,
            ));
        }

        if record.status_code >= 500 {
            raised.push(Alert::new(
                AlertKind::ServerError,
                AlertSeverity::Critical,
                &record.request_id,
                format!(
                    "Server error {} on {} {}",
                    record.status_code, record.method, record.url
                ),
                500.0,
                record.status_code as f64,
            ));
        }

        raised
    }

    /// Summarises records created at or after `since`
    pub fn calculate_stats<'a>(
        records: impl Iterator<Item = &'a MetricRecord>,
        since: Option<DateTime<Utc>>,
        config: &MonitorConfig,
    ) -> PerformanceStats {
        let mut response_times = Vec::new();
        let mut errored = 0;
        let mut slow_requests = 0;
        let mut total_database_queries = 0;
        let mut slow_database_queries = 0;
        let mut failed_external_calls = 0;
        let mut by_url: HashMap<&str, (u64, usize)> = HashMap::new();

        for record in records.filter(|r| since.is_none_or(|s| r.timestamp >= s)) {
            response_times.push(record.response_time_ms);
            if record.is_error() {
                errored += 1;
            }
            if config.is_slow_request(record.response_time_ms) {
                slow_requests += 1;
            }

            total_database_queries += record.database_queries.len();
            slow_database_queries += record
                .database_queries
                .iter()
                .filter(|q| config.is_slow_query(q.execution_time_ms))
                .count();
            failed_external_calls += record.external_calls.iter().filter(|c| !c.success).count();

            let entry = by_url.entry(record.url.as_str()).or_default();
            entry.0 += record.response_time_ms;
            entry.1 += 1;
        }

        if response_times.is_empty() {
            return PerformanceStats::empty();
        }

        let total_requests = response_times.len();
        let average_response_time =
            response_times.iter().sum::<u64>() as f64 / total_requests as f64;
        response_times.sort_unstable();

        let mut top_slow_endpoints: Vec<EndpointStats> = by_url
            .into_iter()
            .map(|(url, (sum, count))| EndpointStats {
                url: url.to_string(),
                average_response_time: sum as f64 / count as f64,
                count,
            })
            .collect();
        top_slow_endpoints.sort_by(|a, b| {
            b.average_response_time
                .total_cmp(&a.average_response_time)
                .then_with(|| a.url.cmp(&b.url))
        });
        top_slow_endpoints.truncate(config.top_endpoints_limit);

        PerformanceStats {
            total_requests,
            average_response_time,
            error_rate: errored as f64 / total_requests as f64,
            slow_requests,
            top_slow_endpoints,
            p50_response_time: Self::calculate_percentile(&response_times, 50.0),
            p95_response_time: Self::calculate_percentile(&response_times, 95.0),
            p99_response_time: Self::calculate_percentile(&response_times, 99.0),
            total_database_queries,
            slow_database_queries,
            failed_external_calls,
        }
    }

    fn calculate_percentile(sorted_data: &[u64], percentile: f64) -> f64 {
        if sorted_data.is_empty() {
            return 0.0;
        }

        let len = sorted_data.len() as f64;
        let rank = (percentile / 100.0 * len).ceil() as usize;

        let index = rank.saturating_sub(1);
        sorted_data[index.min(sorted_data.len() - 1)] as f64
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Oldest timestamp still inside a window of `range` ending at `now`
fn cutoff(now: DateTime<Utc>, range: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(range)
        .ok()
        .and_then(|range| now.checked_sub_signed(range))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

use std::{sync::Arc, time::Duration};

use crate::infrastructure::monitoring::PerformanceMonitor;

/// Periodically drops records older than the configured retention, so an
/// idle service does not hold stale data until the next insert.
pub struct MetricsPruner {
    monitor: Arc<PerformanceMonitor>,
    interval_seconds: u64,
}

impl MetricsPruner {
    pub fn new(monitor: Arc<PerformanceMonitor>, interval_seconds: u64) -> Self {
        Self {
            monitor,
            interval_seconds: interval_seconds.max(10),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Runs a single pruning pass, returning how many records were dropped
    pub async fn run_once(&self) -> usize {
        let removed = self.monitor.cleanup_old_metrics().await;
        if removed > 0 {
            let remaining = self.monitor.len().await;
            tracing::info!(removed, remaining, "Pruned old metrics");
        }
        removed
    }

    pub async fn start(&self) {
        loop {
            tokio::time::sleep(self.interval()).await;
            self.run_once().await;
        }
    }
}

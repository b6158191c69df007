use std::{sync::Arc, time::Duration};

use crate::infrastructure::monitoring::ProcessSampler;

/// Keeps the process sample cache warm for the request middleware.
pub struct ResourceSampler {
    sampler: Arc<ProcessSampler>,
    interval_ms: u64,
}

impl ResourceSampler {
    pub fn new(sampler: Arc<ProcessSampler>, interval_ms: u64) -> Self {
        Self {
            sampler,
            interval_ms: interval_ms.max(100),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub async fn start(&self) {
        loop {
            if self.sampler.refresh().await.is_none() {
                tracing::debug!("Process sample unavailable");
            }
            tokio::time::sleep(self.interval()).await;
        }
    }
}

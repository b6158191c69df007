//! Threshold alerts raised during ingestion.
//!
//! Alerts are advisory. They are handed to an [`AlertSink`] after the store
//! lock has been released, and a sink that panics is contained here so the
//! recording caller never observes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

/// Alert representation for monitoring systems
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub request_id: String,
    pub message: String,
    pub threshold: f64,
    pub current_value: f64,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        severity: AlertSeverity,
        request_id: &str,
        message: String,
        threshold: f64,
        current_value: f64,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            kind,
            severity,
            request_id: request_id.to_string(),
            message,
            threshold,
            current_value,
            created_at: Utc::now(),
        }
    }
}

/// Which threshold an alert was raised for
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SlowRequest,
    HighMemory,
    ServerError,
    SlowQuery,
    RequestError,
    ErrorSpike,
}

/// Alert severity levels
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// Receives alerts produced by threshold checks.
///
/// Implementations must be cheap: they run inline on the recording path.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink: Send + Sync {
    fn on_alert(&self, alert: &Alert);
}

impl<F> AlertSink for F
where
    F: Fn(&Alert) + Send + Sync,
{
    fn on_alert(&self, alert: &Alert) {
        self(alert)
    }
}

/// Default sink, logs every alert as a warning
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn on_alert(&self, alert: &Alert) {
        warn!(
            kind = ?alert.kind,
            severity = ?alert.severity,
            request_id = %alert.request_id,
            threshold = alert.threshold,
            current_value = alert.current_value,
            "Alert created: {}",
            alert.message
        );
    }
}

/// Delivers alerts to the sink, swallowing sink panics.
pub(crate) fn dispatch(sink: &dyn AlertSink, alerts: Vec<Alert>) {
    for alert in alerts {
        if catch_unwind(AssertUnwindSafe(|| sink.on_alert(&alert))).is_err() {
            error!(alert_id = %alert.id, "Alert sink panicked while handling alert");
        }
    }
}

/// Sliding window of recent error timestamps for spike detection.
///
/// Edge-triggered: a spike is reported once when the window reaches the
/// threshold and again only after the window has dropped back below it.
#[derive(Debug, Default)]
pub(crate) struct ErrorSpikeTracker {
    recent: VecDeque<DateTime<Utc>>,
    spiking: bool,
}

impl ErrorSpikeTracker {
    /// Records an error at `at`, returning the window count when this error
    /// starts a new spike.
    ///
    /// The window never holds more than `limit` entries.
    pub(crate) fn observe(
        &mut self,
        at: DateTime<Utc>,
        window: Duration,
        limit: usize,
    ) -> Option<usize> {
        let limit = limit.max(1);
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        let cutoff = at
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        while self.recent.front().is_some_and(|t| *t < cutoff) {
            self.recent.pop_front();
        }
        if self.recent.is_empty() || self.recent.len() + 1 < limit {
            self.spiking = false;
        }

        self.recent.push_back(at);
        while self.recent.len() > limit {
            self.recent.pop_front();
        }

        if self.recent.len() >= limit && !self.spiking {
            self.spiking = true;
            Some(self.recent.len())
        } else {
            None
        }
    }

    pub(crate) fn clear(&mut self) {
        self.recent.clear();
        self.spiking = false;
    }
}

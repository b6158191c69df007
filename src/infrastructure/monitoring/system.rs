//! Resource sampling for the current process.
//!
//! Refreshing from the OS is blocking work, so it runs on the blocking pool and
//! the result is cached. Request-path readers only see the cached sample.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use sysinfo::{Pid, System};
use tokio::sync::watch;
use tracing::warn;

/// Point-in-time resource usage of this process
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProcessSample {
    /// Resident memory in bytes
    pub memory_bytes: u64,
    /// CPU usage percentage since the previous sample
    pub cpu_usage: Option<f64>,
}

/// Samples memory and CPU of the running process via `sysinfo`
pub struct ProcessSampler {
    system: Arc<Mutex<System>>,
    pid: Option<Pid>,
    latest: watch::Sender<Option<ProcessSample>>,
}

impl ProcessSampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Process sampling disabled: {}", e);
                None
            }
        };

        Self {
            system: Arc::new(Mutex::new(System::new())),
            pid,
            latest: watch::Sender::new(None),
        }
    }

    /// Reads this process from the OS and caches the result.
    ///
    /// Returns `None` if the platform cannot report it; the cached sample is
    /// kept in that case.
    pub async fn refresh(&self) -> Option<ProcessSample> {
        let pid = self.pid?;
        let system = self.system.clone();

        let sample = tokio::task::spawn_blocking(move || {
            let mut system = system.lock().ok()?;
            if !system.refresh_process(pid) {
                return None;
            }
            system.process(pid).map(|process| ProcessSample {
                memory_bytes: process.memory(),
                cpu_usage: Some(f64::from(process.cpu_usage())),
            })
        })
        .await
        .ok()
        .flatten();

        if sample.is_some() {
            self.latest.send_replace(sample);
        }
        sample
    }

    /// Most recent cached sample, `None` until the first successful refresh
    pub fn latest(&self) -> Option<ProcessSample> {
        *self.latest.borrow()
    }
}

impl Default for ProcessSampler {
    fn default() -> Self {
        Self::new()
    }
}

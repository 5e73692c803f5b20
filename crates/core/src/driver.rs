// crates/core/src/driver.rs
//! Background tasks that advance job progress on a fixed schedule.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::JobConfig;
use crate::error::JobError;
use crate::registry::JobRegistry;
use crate::types::{JobId, COMPLETE};

/// How a single driver task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// Progress reached 100 after `ticks` advancements.
    Completed { ticks: u32 },
    /// Shutdown was requested before completion.
    Cancelled,
    /// The registry entry disappeared; the driver stopped without recreating it.
    Vanished,
}

/// Spawns and tracks one progress task per job.
///
/// Every task is registered with a `TaskTracker` and observes a shared
/// `CancellationToken`, so `shutdown` can stop and join all of them.
pub struct ProgressDriver {
    registry: Arc<JobRegistry>,
    increment: u8,
    period: Duration,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl ProgressDriver {
    pub fn new(registry: Arc<JobRegistry>, config: &JobConfig, cancel: CancellationToken) -> Self {
        Self {
            registry,
            increment: config.increment,
            period: config.period,
            tracker: TaskTracker::new(),
            cancel,
        }
    }

    /// Start advancing `id` toward completion without blocking the caller.
    pub fn start(&self, id: JobId) -> JoinHandle<DriverOutcome> {
        let registry = Arc::clone(&self.registry);
        let cancel = self.cancel.clone();
        let (increment, period) = (self.increment, self.period);
        self.tracker
            .spawn(async move { advance(registry, id, increment, period, cancel).await })
    }

    /// Number of drivers still running.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Cancel every driver and wait for all of them to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn advance(
    registry: Arc<JobRegistry>,
    id: JobId,
    increment: u8,
    period: Duration,
    cancel: CancellationToken,
) -> DriverOutcome {
    let Some(mut progress) = registry.get(&id) else {
        tracing::debug!(job_id = %id, "Job vanished before its driver started");
        return DriverOutcome::Vanished;
    };
    tracing::debug!(job_id = %id, progress, "Progress driver started");

    let mut ticks = 0u32;
    while progress < COMPLETE {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(job_id = %id, progress, "Progress driver cancelled");
                return DriverOutcome::Cancelled;
            }
            _ = tokio::time::sleep(period) => {}
        }

        let next = progress.saturating_add(increment).min(COMPLETE);
        match registry.set(&id, next) {
            Ok(stored) => progress = stored,
            Err(JobError::NotFound(_)) => {
                tracing::debug!(job_id = %id, "Job vanished mid-run, driver stopping");
                return DriverOutcome::Vanished;
            }
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Progress write failed, driver stopping");
                return DriverOutcome::Vanished;
            }
        }
        ticks += 1;
        tracing::debug!(job_id = %id, progress, tick = ticks, "Progress advanced");
    }

    tracing::info!(job_id = %id, ticks, "Job completed");
    DriverOutcome::Completed { ticks }
}

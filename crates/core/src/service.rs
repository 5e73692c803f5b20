// crates/core/src/service.rs
//! Job lifecycle facade used by the HTTP layer.
//!
//! Provides:
//! - `submit` — create a job and start its progress driver
//! - `check_status` — immediate read of a job's progress
//! - `wait_for_completion` — long-poll until a job reaches 100
//! - a background sweeper evicting completed jobs past their retention

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::JobConfig;
use crate::driver::ProgressDriver;
use crate::error::{JobError, JobResult};
use crate::registry::JobRegistry;
use crate::types::{JobId, JobSnapshot, COMPLETE};

pub struct JobService {
    config: JobConfig,
    registry: Arc<JobRegistry>,
    driver: ProgressDriver,
    background: TaskTracker,
    shutdown: CancellationToken,
}

impl JobService {
    pub fn new(config: JobConfig) -> JobResult<Self> {
        config.validate()?;
        let registry = Arc::new(JobRegistry::new(config.max_jobs, config.retention));
        let shutdown = CancellationToken::new();
        let driver = ProgressDriver::new(Arc::clone(&registry), &config, shutdown.child_token());
        Ok(Self {
            config,
            registry,
            driver,
            background: TaskTracker::new(),
            shutdown,
        })
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn driver(&self) -> &ProgressDriver {
        &self.driver
    }

    /// Create a job at progress 0 and start driving it. Returns its id.
    ///
    /// Refused once shutdown has begun: no driver would ever complete it.
    pub fn submit(&self) -> JobResult<JobId> {
        if self.shutdown.is_cancelled() {
            return Err(JobError::ShuttingDown);
        }
        let id = JobId::generate();
        self.registry.create(id.clone())?;
        self.driver.start(id.clone());
        tracing::info!(job_id = %id, "Job submitted");
        Ok(id)
    }

    /// Current state of a job, without waiting.
    pub fn check_status(&self, id: &JobId) -> JobResult<JobSnapshot> {
        self.registry
            .snapshot(id)
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    /// Suspend until the job reaches 100, then return its final state.
    ///
    /// An unknown id fails immediately. Dropping the returned future (for
    /// example when the client disconnects) releases the wait and leaves the
    /// driver running.
    pub async fn wait_for_completion(&self, id: &JobId) -> JobResult<JobSnapshot> {
        let mut rx = self
            .registry
            .subscribe(id)
            .ok_or_else(|| JobError::NotFound(id.clone()))?;

        // The completed snapshot comes from the channel itself, so a sweep
        // right after the final write cannot turn this into a NotFound.
        // A closed channel with no completed value means eviction mid-wait.
        let snapshot = rx
            .wait_for(|snapshot| snapshot.progress >= COMPLETE)
            .await
            .map_err(|_| JobError::NotFound(id.clone()))?
            .clone();
        Ok(snapshot)
    }

    pub fn list(&self) -> Vec<JobSnapshot> {
        self.registry.snapshots()
    }

    /// Spawn the periodic eviction sweep. Call once from inside the runtime.
    pub fn spawn_sweeper(&self) {
        let registry = Arc::clone(&self.registry);
        let interval = self.config.sweep_interval;
        let shutdown = self.shutdown.clone();
        self.background.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let evicted = registry.sweep_expired();
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = registry.len(), "Evicted expired jobs");
                }
            }
        });
    }

    /// Stop the sweeper and every progress driver, then wait for them to exit.
    pub async fn shutdown(&self) {
        tracing::info!(active_drivers = self.driver.active(), "Shutting down job service");
        self.shutdown.cancel();
        self.driver.shutdown().await;
        self.background.close();
        self.background.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::time::Instant;

    use crate::types::JobStatus;

    fn service() -> JobService {
        JobService::new(JobConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = JobConfig {
            increment: 0,
            ..Default::default()
        };
        assert!(matches!(
            JobService::new(config),
            Err(JobError::InvalidConfig(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_then_check_starts_at_zero() {
        let svc = service();
        let id = svc.submit().unwrap();

        let snap = svc.check_status(&id).unwrap();
        assert_eq!(snap.progress, 0);
        assert_eq!(snap.status, JobStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_status_unknown_is_not_found() {
        let svc = service();
        let id = JobId::from("job:unknown");
        assert_eq!(svc.check_status(&id), Err(JobError::NotFound(id.clone())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_reads_are_monotonic_and_bounded() {
        let svc = service();
        let id = svc.submit().unwrap();

        let mut last = 0;
        for _ in 0..60 {
            tokio::time::sleep(Duration::from_millis(900)).await;
            let progress = svc.check_status(&id).unwrap().progress;
            assert!(progress >= last, "progress went backwards: {last} -> {progress}");
            assert!(progress <= 100);
            last = progress;
        }
        assert_eq!(last, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_waits_for_final_tick() {
        let svc = Arc::new(service());
        let id = svc.submit().unwrap();
        let start = Instant::now();

        let waiter = {
            let svc = Arc::clone(&svc);
            let id = id.clone();
            tokio::spawn(async move { svc.wait_for_completion(&id).await })
        };

        // 19 ticks in: still pending at 95.
        tokio::time::sleep(svc.config().period * 19 + Duration::from_millis(500)).await;
        assert_eq!(svc.check_status(&id).unwrap().progress, 95);
        assert!(!waiter.is_finished());

        let snap = waiter.await.unwrap().unwrap();
        assert_eq!(snap.progress, 100);
        assert!(snap.is_complete());
        assert!(start.elapsed() >= svc.config().time_to_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_unknown_fails_without_waiting() {
        let svc = service();
        let start = Instant::now();
        let id = JobId::from("job:unknown");

        let result = svc.wait_for_completion(&id).await;
        assert_eq!(result, Err(JobError::NotFound(id)));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_on_completed_job_returns_at_once() {
        let svc = service();
        let id = svc.submit().unwrap();
        tokio::time::sleep(svc.config().time_to_complete() + Duration::from_secs(1)).await;

        let start = Instant::now();
        let snap = svc.wait_for_completion(&id).await.unwrap();
        assert_eq!(snap.progress, 100);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_long_poll_leaves_driver_running() {
        let svc = service();
        let id = svc.submit().unwrap();

        let abandoned = tokio::time::timeout(Duration::from_secs(5), svc.wait_for_completion(&id)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(svc.config().time_to_complete()).await;
        assert_eq!(svc.check_status(&id).unwrap().progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submissions_are_independent() {
        let svc = Arc::new(service());
        let first = svc.submit().unwrap();
        tokio::time::sleep(Duration::from_millis(4500)).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move { svc.submit().unwrap() }));
        }
        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 8);
        assert!(!ids.contains(&first));

        assert_eq!(svc.check_status(&first).unwrap().progress, 10);
        for id in &ids {
            assert_eq!(svc.check_status(id).unwrap().progress, 0);
        }
        assert_eq!(svc.list().len(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_completed_jobs() {
        let config = JobConfig {
            increment: 50,
            period: Duration::from_secs(1),
            retention: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(1),
            ..Default::default()
        };
        let svc = JobService::new(config).unwrap();
        svc.spawn_sweeper();
        let id = svc.submit().unwrap();

        // Completes at t=2, expires at t=7, swept on the next interval.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(svc.check_status(&id).unwrap().is_complete());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(svc.check_status(&id), Err(JobError::NotFound(id)));
        assert!(svc.registry().is_empty());

        svc.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_keeps_result_when_evicted_on_completion() {
        let config = JobConfig {
            retention: Duration::ZERO,
            ..Default::default()
        };
        let svc = Arc::new(JobService::new(config).unwrap());
        let id = svc.submit().unwrap();

        let waiter = {
            let svc = Arc::clone(&svc);
            let id = id.clone();
            tokio::spawn(async move { svc.wait_for_completion(&id).await })
        };
        // Let the waiter subscribe and park.
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        // Final write and an immediate sweep, before the waiter runs again.
        svc.registry().set(&id, 100).unwrap();
        assert_eq!(svc.registry().sweep_expired(), 1);
        assert!(!svc.registry().contains(&id));

        let snap = waiter.await.unwrap().unwrap();
        assert_eq!(snap.job_id, id);
        assert_eq!(snap.progress, 100);
        assert!(snap.completed_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_after_shutdown_is_refused() {
        let svc = service();
        svc.shutdown().await;

        assert_eq!(svc.submit(), Err(JobError::ShuttingDown));
        assert!(svc.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_drivers() {
        let svc = service();
        svc.spawn_sweeper();
        let id = svc.submit().unwrap();
        tokio::time::sleep(Duration::from_millis(4500)).await;

        svc.shutdown().await;
        assert_eq!(svc.driver().active(), 0);

        tokio::time::sleep(svc.config().time_to_complete()).await;
        assert_eq!(svc.check_status(&id).unwrap().progress, 10);
    }
}

// crates/core/src/registry.rs
//! In-memory registry mapping job ids to their progress.
//!
//! Each entry owns a `watch` channel holding the job's current snapshot, so
//! readers can either sample it or subscribe and be woken on every write.
//! Completed entries are evicted once they outlive the retention window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{JobError, JobResult};
use crate::types::{JobId, JobSnapshot, JobStatus, COMPLETE};

struct JobEntry {
    /// Insertion order, used for stable listing.
    seq: u64,
    /// Latest snapshot; subscribers receive the full state with every write.
    snapshot_tx: watch::Sender<JobSnapshot>,
    /// Monotonic completion instant, used for eviction.
    completed: Option<Instant>,
}

impl JobEntry {
    fn new(seq: u64, id: JobId) -> Self {
        let (snapshot_tx, _) = watch::channel(JobSnapshot {
            job_id: id,
            progress: 0,
            status: JobStatus::Running,
            created_at: Utc::now(),
            completed_at: None,
        });
        Self {
            seq,
            snapshot_tx,
            completed: None,
        }
    }

    fn progress(&self) -> u8 {
        self.snapshot_tx.borrow().progress
    }

    fn snapshot(&self) -> JobSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    fn is_expired(&self, now: Instant, retention: Duration) -> bool {
        match self.completed {
            Some(done) => now.saturating_duration_since(done) >= retention,
            None => false,
        }
    }
}

/// Single source of truth for job progress.
///
/// Uses `std::sync::RwLock`: the lock is never held across an `.await`, and
/// the only writer per key is that job's progress driver.
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobEntry>>,
    next_seq: AtomicU64,
    max_jobs: usize,
    retention: Duration,
}

impl JobRegistry {
    pub fn new(max_jobs: usize, retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            max_jobs,
            retention,
        }
    }

    /// Insert a new job at progress 0.
    ///
    /// Fails with `AlreadyExists` on a duplicate id. When the registry is at
    /// capacity, expired entries are swept first; if it is still full the
    /// call fails with `CapacityExceeded`.
    pub fn create(&self, id: JobId) -> JobResult<()> {
        let mut jobs = self.write();
        if jobs.contains_key(&id) {
            return Err(JobError::AlreadyExists(id));
        }
        if jobs.len() >= self.max_jobs {
            let evicted = evict_expired(&mut jobs, Instant::now(), self.retention);
            if evicted > 0 {
                tracing::debug!(evicted, "Evicted expired jobs under capacity pressure");
            }
            if jobs.len() >= self.max_jobs {
                return Err(JobError::CapacityExceeded { max: self.max_jobs });
            }
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        jobs.insert(id.clone(), JobEntry::new(seq, id));
        Ok(())
    }

    /// Current progress, or `None` for an unknown id.
    pub fn get(&self, id: &JobId) -> Option<u8> {
        self.read().get(id).map(JobEntry::progress)
    }

    /// Write a new progress value and wake any subscribers.
    ///
    /// The value is clamped to 100 and never lowers the stored progress.
    /// A completed job is left untouched. Returns the stored value.
    pub fn set(&self, id: &JobId, value: u8) -> JobResult<u8> {
        let mut jobs = self.write();
        let entry = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.clone()))?;

        let current = entry.progress();
        if current >= COMPLETE {
            return Ok(current);
        }

        let next = value.min(COMPLETE).max(current);
        if next == current {
            return Ok(current);
        }
        let completed_at = (next >= COMPLETE).then(Utc::now);
        entry.snapshot_tx.send_modify(|snapshot| {
            snapshot.progress = next;
            snapshot.status = JobStatus::from_progress(next);
            snapshot.completed_at = completed_at;
        });
        if completed_at.is_some() {
            entry.completed = Some(Instant::now());
        }
        Ok(next)
    }

    pub fn snapshot(&self, id: &JobId) -> Option<JobSnapshot> {
        self.read().get(id).map(JobEntry::snapshot)
    }

    /// All tracked jobs, oldest first.
    pub fn snapshots(&self) -> Vec<JobSnapshot> {
        let jobs = self.read();
        let mut entries: Vec<&JobEntry> = jobs.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(JobEntry::snapshot).collect()
    }

    /// Receiver that observes every progress write for this job.
    ///
    /// The receiver reports a closed channel once the entry is evicted and
    /// its last value has been seen.
    pub fn subscribe(&self, id: &JobId) -> Option<watch::Receiver<JobSnapshot>> {
        self.read().get(id).map(|entry| entry.snapshot_tx.subscribe())
    }

    /// Remove completed jobs older than the retention window.
    /// Returns how many entries were evicted.
    pub fn sweep_expired(&self) -> usize {
        evict_expired(&mut self.write(), Instant::now(), self.retention)
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, JobEntry>> {
        self.jobs.read().unwrap_or_else(|e| {
            tracing::error!("RwLock poisoned reading jobs map: {e}");
            PoisonError::into_inner(e)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, JobEntry>> {
        self.jobs.write().unwrap_or_else(|e| {
            tracing::error!("RwLock poisoned writing jobs map: {e}");
            PoisonError::into_inner(e)
        })
    }
}

fn evict_expired(
    jobs: &mut HashMap<JobId, JobEntry>,
    now: Instant,
    retention: Duration,
) -> usize {
    let before = jobs.len();
    jobs.retain(|_, entry| !entry.is_expired(now, retention));
    before - jobs.len()
}

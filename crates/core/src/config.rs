// crates/core/src/config.rs
//! Process-wide job tuning knobs.

use std::time::Duration;

use crate::error::{JobError, JobResult};
use crate::types::COMPLETE;

/// Default progress step per driver tick.
pub const DEFAULT_INCREMENT: u8 = 5;
/// Default delay between driver ticks.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(2000);
/// How long a completed job stays queryable before eviction.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(600);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_JOBS: usize = 10_000;

/// Configuration shared by every job. Not adjustable per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub increment: u8,
    pub period: Duration,
    pub retention: Duration,
    pub sweep_interval: Duration,
    pub max_jobs: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            increment: DEFAULT_INCREMENT,
            period: DEFAULT_PERIOD,
            retention: DEFAULT_RETENTION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }
}

impl JobConfig {
    pub fn validate(&self) -> JobResult<()> {
        if self.increment == 0 || self.increment > COMPLETE {
            return Err(JobError::invalid_config(format!(
                "increment must be in 1..={COMPLETE}, got {}",
                self.increment
            )));
        }
        if self.period.is_zero() {
            return Err(JobError::invalid_config("period must be non-zero"));
        }
        if self.sweep_interval.is_zero() {
            return Err(JobError::invalid_config("sweep interval must be non-zero"));
        }
        if self.max_jobs == 0 {
            return Err(JobError::invalid_config("max jobs must be non-zero"));
        }
        Ok(())
    }

    /// Number of driver ticks needed to take a job from 0 to complete.
    pub fn ticks_to_complete(&self) -> u32 {
        u32::from(COMPLETE).div_ceil(u32::from(self.increment.max(1)))
    }

    /// Expected wall time from submission to completion.
    pub fn time_to_complete(&self) -> Duration {
        self.period * self.ticks_to_complete()
    }
}

// crates/core/src/error.rs
use thiserror::Error;

use crate::types::JobId;

/// Errors raised by the job registry and the service built on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job already exists: {0}")]
    AlreadyExists(JobId),

    #[error("Job registry is full ({max} jobs)")]
    CapacityExceeded { max: usize },

    #[error("Job service is shutting down")]
    ShuttingDown,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl JobError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type JobResult<T> = Result<T, JobError>;

// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use clap::ValueEnum;
use jobpoll_core::JobService;

/// How `GET /checkStatus` answers when the request does not say.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusMode {
    /// Respond with the current progress right away.
    #[default]
    Immediate,
    /// Hold the request open until the job completes.
    LongPoll,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Job registry, progress drivers and status lookups.
    pub jobs: Arc<JobService>,
    /// Default answer mode for status checks.
    pub status_mode: StatusMode,
}

impl AppState {
    pub fn new(jobs: Arc<JobService>, status_mode: StatusMode) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            jobs,
            status_mode,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

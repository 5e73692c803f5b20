// crates/server/src/cli.rs
//! Command-line and environment configuration for the `jobpoll` binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use jobpoll_core::config::{
    DEFAULT_INCREMENT, DEFAULT_MAX_JOBS, DEFAULT_PERIOD, DEFAULT_RETENTION,
    DEFAULT_SWEEP_INTERVAL,
};
use jobpoll_core::JobConfig;

use crate::state::StatusMode;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Parser)]
#[command(name = "jobpoll", version, about = "Asynchronous job tracker with a long-polling status API")]
pub struct Cli {
    /// Address to bind.
    #[arg(long, env = "JOBPOLL_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "JOBPOLL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// How `GET /checkStatus` answers when the request has no `wait` parameter.
    #[arg(long, env = "JOBPOLL_STATUS_MODE", value_enum, default_value_t = StatusMode::Immediate)]
    pub status_mode: StatusMode,

    /// Progress added on every driver tick.
    #[arg(long, env = "JOBPOLL_INCREMENT", default_value_t = DEFAULT_INCREMENT)]
    pub increment: u8,

    /// Milliseconds between driver ticks.
    #[arg(long, env = "JOBPOLL_PERIOD_MS", default_value_t = DEFAULT_PERIOD.as_millis() as u64)]
    pub period_ms: u64,

    /// Seconds a completed job stays queryable.
    #[arg(long, env = "JOBPOLL_RETENTION_SECS", default_value_t = DEFAULT_RETENTION.as_secs())]
    pub retention_secs: u64,

    /// Seconds between eviction sweeps.
    #[arg(long, env = "JOBPOLL_SWEEP_INTERVAL_SECS", default_value_t = DEFAULT_SWEEP_INTERVAL.as_secs())]
    pub sweep_interval_secs: u64,

    /// Maximum number of tracked jobs.
    #[arg(long, env = "JOBPOLL_MAX_JOBS", default_value_t = DEFAULT_MAX_JOBS)]
    pub max_jobs: usize,
}

impl Cli {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Job settings; validated by `JobService::new`.
    pub fn job_config(&self) -> JobConfig {
        JobConfig {
            increment: self.increment,
            period: Duration::from_millis(self.period_ms),
            retention: Duration::from_secs(self.retention_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            max_jobs: self.max_jobs,
        }
    }
}

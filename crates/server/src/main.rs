// crates/server/src/main.rs
//! jobpoll server binary.
//!
//! Parses configuration, starts the eviction sweeper, serves HTTP until
//! Ctrl-C, then cancels and joins every running progress driver.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use jobpoll_core::JobService;
use jobpoll_server::cli::Cli;
use jobpoll_server::{create_app, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,jobpoll_server=info,jobpoll_core=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let jobs = Arc::new(JobService::new(cli.job_config())?);
    jobs.spawn_sweeper();

    let app = create_app(AppState::new(Arc::clone(&jobs), cli.status_mode));

    let addr = cli.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        status_mode = ?cli.status_mode,
        increment = cli.increment,
        period_ms = cli.period_ms,
        "Server is running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    jobs.shutdown().await;
    Ok(())
}

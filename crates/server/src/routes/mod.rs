//! API route handlers for the jobpoll server.

pub mod health;
pub mod jobs;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - POST /submit - Create a job and start its progress driver
/// - GET  /checkStatus?jobId=&wait= - Job progress, immediately or once complete
/// - GET  /jobs - All tracked jobs
/// - GET  /health - Health check
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(jobs::router())
        .with_state(state)
}

// crates/server/src/routes/jobs.rs
//! API routes for job submission and status.
//!
//! - POST /submit — Create a job, respond with its id
//! - GET /checkStatus — Progress of one job (immediate or long-poll)
//! - GET /jobs — List all tracked jobs

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jobpoll_core::{JobId, JobSnapshot};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, StatusMode};

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: JobId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub job_id: Option<String>,
    /// Overrides the server's default status mode for this request.
    pub wait: Option<bool>,
}

impl StatusQuery {
    fn job_id(&self) -> ApiResult<JobId> {
        self.job_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(JobId::from)
            .ok_or_else(|| ApiError::InvalidRequest("missing jobId query parameter".into()))
    }

    fn long_poll(&self, default: StatusMode) -> bool {
        self.wait.unwrap_or(default == StatusMode::LongPoll)
    }
}

/// Clients preferring `text/plain` get the legacy blank-line framing.
///
/// The winning media range is the one with the highest q-value, earliest in
/// the header on ties. Ranges with `q=0` are not acceptable and never win.
fn wants_plain_text(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mut best: Option<(&str, f32)> = None;
    for part in accept.split(',') {
        let mut params = part.split(';');
        let range = params.next().unwrap_or_default().trim();
        if range.is_empty() {
            continue;
        }
        let quality = params
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);
        if quality <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, q)| quality > q) {
            best = Some((range, quality));
        }
    }

    best.is_some_and(|(range, _)| range.eq_ignore_ascii_case("text/plain"))
}

fn legacy_body(value: impl Display) -> String {
    format!("\n\n{value}\n\n")
}

/// POST /submit — Create a job and start driving it.
async fn submit(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Response> {
    let job_id = state.jobs.submit()?;
    let response = if wants_plain_text(&headers) {
        (StatusCode::CREATED, legacy_body(&job_id)).into_response()
    } else {
        (StatusCode::CREATED, Json(SubmitResponse { job_id })).into_response()
    };
    Ok(response)
}

/// GET /checkStatus?jobId=<id>[&wait=true|false]
///
/// Unknown ids fail with 404 before any waiting starts. A long-poll that the
/// client abandons is dropped with the request; the job keeps progressing.
async fn check_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let job_id = query.job_id()?;

    let snapshot: JobSnapshot = if query.long_poll(state.status_mode) {
        tracing::debug!(job_id = %job_id, "Long-poll waiting for completion");
        state.jobs.wait_for_completion(&job_id).await?
    } else {
        state.jobs.check_status(&job_id)?
    };

    let response = if wants_plain_text(&headers) {
        legacy_body(snapshot.progress).into_response()
    } else {
        Json(snapshot).into_response()
    };
    Ok(response)
}

/// GET /jobs — Snapshot of every tracked job, oldest first.
async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobSnapshot>> {
    Json(state.jobs.list())
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/submit", post(submit))
        .route("/checkStatus", get(check_status))
        .route("/jobs", get(list_jobs))
}

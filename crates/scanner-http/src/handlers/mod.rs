//! HTTP request handlers. Thin wrappers: each handler extracts its inputs, delegates to the
//! [`crate::controller::ScanController`], and maps the result onto a response DTO. No orchestration
//! logic lives here.

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use chrono::Utc;
use scanner_core::RegistryState;
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::dto::{HealthResponse, JobListResponse, JobSummary, ScanResultResponse, SubmitResponse};
use crate::error::HttpError;
use crate::job_monitor::AggregateRecord;
use crate::state::AppState;

/// `GET /health`: `{status, version, user, timestamp}`.
pub async fn health(Extension(user): Extension<AuthenticatedUser>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        user: user.0,
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Deserialize)]
pub struct SubmitScanRequest {
    pub git_url: String,
}

/// `POST /scan`: submit a job, returns `{job_id, status, created_at}`.
pub async fn submit_scan(
    State(state): State<AppState>,
    Json(request): Json<SubmitScanRequest>,
) -> Result<Json<SubmitResponse>, HttpError> {
    let job = state.controller.submit(request.git_url)?;
    Ok(Json(SubmitResponse::from(&job)))
}

/// `GET /scan/{job_id}`: the Monitor's detailed aggregate record.
pub async fn get_aggregate(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<AggregateRecord> {
    Json(state.controller.status(&job_id).await)
}

/// `GET /jobs/{job_id}/results`: the final `ScanResultResponse`.
pub async fn get_results(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ScanResultResponse>, HttpError> {
    Ok(Json(state.controller.result(&job_id)?))
}

/// `GET /jobs/{job_id}/partial`: a snapshot while the job is running.
pub async fn get_partial(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<AggregateRecord>, HttpError> {
    Ok(Json(state.controller.partial(&job_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    pub status: Option<String>,
}

const fn default_page() -> usize {
    1
}

const fn default_per_page() -> usize {
    20
}

fn parse_status(raw: Option<&str>) -> Option<RegistryState> {
    match raw? {
        "pending" => Some(RegistryState::Pending),
        "running" => Some(RegistryState::Running),
        "completed" => Some(RegistryState::Completed),
        "failed" => Some(RegistryState::Failed),
        _ => None,
    }
}

/// `GET /jobs`: paginated job history.
pub async fn list_jobs(State(state): State<AppState>, Query(query): Query<ListJobsQuery>) -> Json<JobListResponse> {
    let status = parse_status(query.status.as_deref());
    let page = state.controller.list_jobs(query.page, query.per_page, status);

    Json(JobListResponse {
        jobs: page.jobs.iter().map(JobSummary::from).collect(),
        total: page.total,
        page: query.page,
        per_page: query.per_page,
    })
}

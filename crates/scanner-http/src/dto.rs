//! HTTP response DTOs that don't map 1:1 onto a domain type. `Job.result` (a plain `ScanResult`)
//! only carries the any-in-group category flags; the per-project breakdown the response also needs
//! is assembled here at the HTTP boundary and cached on the registry entry rather than folded into
//! the frozen core domain type.

use chrono::{DateTime, Utc};
use scanner_core::{Job, RegistryState, ScanResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Response shape for `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

/// Response shape for `POST /scan`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<&Job> for SubmitResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: "pending",
            created_at: job.created_at,
        }
    }
}

/// One row of `GET /jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub submission_url: String,
    pub status: &'static str,
    pub percentage: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_at: Option<DateTime<Utc>>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            submission_url: job.submission_url.clone(),
            status: registry_state_label(job.state),
            percentage: job.percentage,
            created_at: job.created_at,
            terminal_at: job.terminal_at,
        }
    }
}

#[must_use]
pub fn registry_state_label(state: RegistryState) -> &'static str {
    match state {
        RegistryState::Pending => "pending",
        RegistryState::Running => "running",
        RegistryState::Completed => "completed",
        RegistryState::Failed => "failed",
    }
}

/// Response shape for `GET /jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobSummary>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Repository,
    Group,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectResult {
    pub project_name: String,
    pub git_url: String,
    pub dependencies: BTreeMap<String, bool>,
    pub infrastructure_usage: BTreeMap<String, bool>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedProject {
    pub project_name: String,
    pub git_url: String,
    pub error: String,
}

/// Response shape for the final scan result.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResultResponse {
    pub git_url: String,
    pub scan_type: ScanType,
    pub dependencies: BTreeMap<String, bool>,
    pub infrastructure_usage: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_projects: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_scans: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_scans: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_results: Option<Vec<ProjectResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_projects: Option<Vec<FailedProject>>,
}

impl ScanResultResponse {
    #[must_use]
    pub fn single_repository(git_url: String, result: &ScanResult) -> Self {
        Self {
            git_url,
            scan_type: ScanType::Repository,
            dependencies: result.dependency_categories.clone(),
            infrastructure_usage: result.infrastructure_categories.clone(),
            total_projects: None,
            successful_scans: None,
            failed_scans: None,
            project_results: None,
            failed_projects: None,
        }
    }

    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn group(
        git_url: String,
        merged: &ScanResult,
        project_results: Vec<ProjectResult>,
        failed_projects: Vec<FailedProject>,
    ) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let total = (project_results.len() + failed_projects.len()) as u32;
        #[allow(clippy::cast_possible_truncation)]
        let successful = project_results.iter().filter(|p| p.status == "success").count() as u32;
        #[allow(clippy::cast_possible_truncation)]
        let failed = total - successful;

        Self {
            git_url,
            scan_type: ScanType::Group,
            dependencies: merged.dependency_categories.clone(),
            infrastructure_usage: merged.infrastructure_categories.clone(),
            total_projects: Some(total),
            successful_scans: Some(successful),
            failed_scans: Some(failed),
            project_results: Some(project_results),
            failed_projects: if failed_projects.is_empty() {
                None
            } else {
                Some(failed_projects)
            },
        }
    }
}

//! In-memory Job Registry. A single mutex-guarded map, the same "one lock for all map operations"
//! policy [`scanner_acquire::Cache`] uses.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;
use scanner_core::{CoreError, Job, RegistryState, ScanResult};

use crate::dto::ScanResultResponse;

/// A page of [`Job`] records plus the total count matching the filter.
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: usize,
}

/// Thread-safe `job_id -> Job` map. Also caches the fully-assembled [`ScanResultResponse`] for each
/// completed job. That response's per-project breakdown doesn't fit the frozen core [`ScanResult`]
/// domain type, so it is built once by the Controller at job completion and cached here alongside
/// the Job record rather than recomputed from the filesystem on every `/jobs/{id}/results` poll.
pub struct JobRegistry {
    jobs: Mutex<BTreeMap<String, Job>>,
    responses: Mutex<BTreeMap<String, ScanResultResponse>>,
    max_concurrent_jobs: usize,
}

impl JobRegistry {
    #[must_use]
    pub fn new(max_concurrent_jobs: usize) -> Self {
        Self {
            jobs: Mutex::new(BTreeMap::new()),
            responses: Mutex::new(BTreeMap::new()),
            max_concurrent_jobs,
        }
    }

    /// Cache the assembled HTTP response for a completed job.
    pub fn cache_response(&self, job_id: &str, response: ScanResultResponse) {
        let mut responses = self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        responses.insert(job_id.to_string(), response);
    }

    #[must_use]
    pub fn get_response(&self, job_id: &str) -> Option<ScanResultResponse> {
        let responses = self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        responses.get(job_id).cloned()
    }

    /// Create a new job. Rejects with `too_many_jobs` if the number of non-terminal jobs is already
    /// at the configured cap.
    pub fn create(&self, job_id: String, submission_url: String) -> Result<Job, CoreError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let running = jobs
            .values()
            .filter(|j| matches!(j.state, RegistryState::Pending | RegistryState::Running))
            .count();
        if running >= self.max_concurrent_jobs {
            return Err(CoreError::too_many_jobs(self.max_concurrent_jobs));
        }

        let job = Job::new(job_id.clone(), submission_url, Utc::now());
        jobs.insert(job_id, job.clone());
        Ok(job)
    }

    /// Transition a job to `running` and/or update its last-known percentage.
    pub fn update_status(&self, job_id: &str, percentage: f64) {
        let mut jobs = self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(job) = jobs.get_mut(job_id) {
            job.state = RegistryState::Running;
            job.percentage = percentage;
        }
    }

    /// Mark `repository_names` discovered so far for a group job.
    pub fn set_repository_names(&self, job_id: &str, names: Vec<String>) {
        let mut jobs = self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(job) = jobs.get_mut(job_id) {
            job.repository_names = names;
        }
    }

    pub fn set_result(&self, job_id: &str, result: ScanResult) {
        let mut jobs = self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(job) = jobs.get_mut(job_id) {
            job.state = RegistryState::Completed;
            job.percentage = 100.0;
            job.result = Some(result);
            job.terminal_at = Some(Utc::now());
        }
    }

    pub fn set_error(&self, job_id: &str, message: String) {
        let mut jobs = self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(job) = jobs.get_mut(job_id) {
            job.state = RegistryState::Failed;
            job.error = Some(message);
            job.terminal_at = Some(Utc::now());
        }
    }

    #[must_use]
    pub fn get(&self, job_id: &str) -> Option<Job> {
        let jobs = self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.get(job_id).cloned()
    }

    /// Paginated, optionally status-filtered listing.
    #[must_use]
    pub fn list(&self, page: usize, per_page: usize, status: Option<RegistryState>) -> JobPage {
        let jobs = self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|j| status.is_none_or(|s| j.state == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len();
        let start = page.saturating_sub(1).saturating_mul(per_page);
        let page_jobs = matching.into_iter().skip(start).take(per_page).collect();

        JobPage { jobs: page_jobs, total }
    }

    /// Remove terminal jobs older than `age` from the in-memory map, mirroring the Monitor's
    /// on-disk `CleanupOldJobs`.
    pub fn prune_older_than(&self, age: chrono::Duration) {
        let mut jobs = self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let cutoff = Utc::now() - age;
        jobs.retain(|_, job| job.terminal_at.is_none_or(|t| t > cutoff));

        let mut responses = self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        responses.retain(|job_id, _| jobs.contains_key(job_id));
    }
}

//! Scan Controller: orchestrates one submitted job end-to-end, from `Submit` through spawning
//! Workers to assembling the final API response, built around the filesystem-as-IPC primitives
//! `scanner_runtime`/`scanner_http::job_monitor` already expose.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scanner_core::{CoreError, EnumeratedProject, GroupEnumerator, Job, MasterPhase, OverallStatus, ScanResult, ScannerConfig};
use scanner_runtime::worker_process::spawn_worker;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::dto::{FailedProject, ProjectResult, ScanResultResponse};
use crate::group_enumerator::is_group_url;
use crate::job_monitor::JobMonitor;
use crate::job_registry::{JobPage, JobRegistry};

/// Composition-root dependencies the Controller needs.
pub struct ScanController {
    config: ScannerConfig,
    registry: Arc<JobRegistry>,
    monitor: Arc<JobMonitor>,
    group_enumerator: Arc<dyn GroupEnumerator>,
}

impl ScanController {
    #[must_use]
    pub fn new(
        config: ScannerConfig,
        registry: Arc<JobRegistry>,
        monitor: Arc<JobMonitor>,
        group_enumerator: Arc<dyn GroupEnumerator>,
    ) -> Self {
        Self {
            config,
            registry,
            monitor,
            group_enumerator,
        }
    }

    /// `Submit(url)`: validates, creates a Registry entry, schedules `Run` asynchronously, returns
    /// the new job.
    pub fn submit(self: &Arc<Self>, git_url: String) -> Result<Job, CoreError> {
        scanner_acquire::validate_git_url(&git_url).map_err(|e| CoreError::invalid_url(e.to_string()))?;

        let job_id = Uuid::new_v4().to_string();
        let job = self.registry.create(job_id.clone(), git_url.clone())?;

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.run(job_id, git_url).await;
        });

        Ok(job)
    }

    /// `Run(job_id, url)`: dispatches to the single-repository or group path depending on the
    /// submitted URL's shape.
    async fn run(&self, job_id: String, git_url: String) {
        let result = if is_group_url(&git_url) {
            self.run_group(&job_id, &git_url).await
        } else {
            self.run_single(&job_id, &git_url).await
        };

        if let Err(e) = result {
            tracing::error!(job_id, error = %e, "job run failed");
            self.registry.set_error(&job_id, e.user_message());
        }
    }

    /// Single-repository path.
    async fn run_single(&self, job_id: &str, git_url: &str) -> Result<(), CoreError> {
        let repo_name = repo_name_from_url(git_url);

        self.monitor
            .write_master(job_id, git_url, |m| {
                m.total_repositories = 1;
                m.pending = vec![repo_name.clone()];
                m.phase = MasterPhase::InProgress;
            })
            .await?;

        self.registry.update_status(job_id, 0.0);
        self.spawn_and_wait(job_id, 0, &repo_name, git_url).await?;

        // Re-aggregate and finalize (step 4): the repo's on-disk terminal
        // phase is the source of truth for whether this job succeeded.
        let repo_status = self.read_repo_status(job_id, 0).await;
        let final_phase = match repo_status.as_ref().map(|s| &s.phase) {
            Some(scanner_core::Phase::Completed) => MasterPhase::Completed,
            _ => MasterPhase::Failed,
        };

        self.monitor
            .write_master(job_id, git_url, |m| {
                m.phase = final_phase;
                m.completed_at = Some(Utc::now());
                if final_phase == MasterPhase::Completed {
                    m.completed = vec![repo_name.clone()];
                    m.pending.clear();
                } else {
                    m.failed = vec![scanner_core::FailedRepo {
                        name: repo_name.clone(),
                        error: repo_status
                            .as_ref()
                            .and_then(|s| s.errors.last())
                            .map_or_else(|| "unknown error".to_string(), |e| e.message.clone()),
                    }];
                    m.pending.clear();
                }
            })
            .await?;

        let aggregate = self.monitor.aggregate(job_id).await;

        if matches!(aggregate.status, OverallStatus::Completed | OverallStatus::CompletedWithErrors) {
            let Some(status) = repo_status else {
                return Err(CoreError::internal("worker exited without a repository status"));
            };
            let result = status.result.unwrap_or_default();
            let response = ScanResultResponse::single_repository(git_url.to_string(), &result);
            self.registry.cache_response(job_id, response);
            self.registry.set_result(job_id, result);
        } else {
            let message = aggregate
                .failed_repositories
                .and_then(|f| f.into_iter().next())
                .map_or_else(|| "repository scan failed".to_string(), |f| f.error);
            self.registry.set_error(job_id, message);
        }

        Ok(())
    }

    /// Group path.
    async fn run_group(&self, job_id: &str, git_url: &str) -> Result<(), CoreError> {
        self.monitor
            .write_master(job_id, git_url, |m| {
                m.total_repositories = 0;
                m.phase = MasterPhase::Initializing;
            })
            .await?;

        let projects = self.group_enumerator.get_project_info(git_url).await?;
        #[allow(clippy::cast_possible_truncation)]
        let total = projects.len() as u32;

        self.registry
            .set_repository_names(job_id, projects.iter().map(|p| p.name.clone()).collect());

        self.monitor
            .write_master(job_id, git_url, |m| {
                m.total_repositories = total;
                m.pending = projects.iter().map(|p| p.name.clone()).collect();
                m.phase = MasterPhase::InProgress;
            })
            .await?;

        if total == 0 {
            self.monitor
                .write_master(job_id, git_url, |m| {
                    m.phase = MasterPhase::Completed;
                    m.completed_at = Some(Utc::now());
                })
                .await?;
            let response = ScanResultResponse::group(git_url.to_string(), &ScanResult::default(), Vec::new(), Vec::new());
            self.registry.cache_response(job_id, response);
            self.registry.set_result(job_id, ScanResult::default());
            return Ok(());
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_processes.max(1)));
        let mut handles = Vec::with_capacity(projects.len());

        for (index, project) in projects.into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let repo_index = index as u32;
            let semaphore = Arc::clone(&semaphore);
            let job_id = job_id.to_string();
            let registry = Arc::clone(&self.registry);
            let monitor_for_progress = Arc::clone(&self.monitor_ref());
            handles.push(tokio::spawn(Self::run_one_project(
                self.config.clone(),
                Arc::clone(&monitor_for_progress),
                semaphore,
                job_id,
                repo_index,
                project,
                registry,
                total,
            )));
        }

        for handle in handles {
            let _ = handle.await;
        }

        let aggregate = self.monitor.aggregate(job_id).await;
        let final_phase = if aggregate.summary.failed == 0 {
            MasterPhase::Completed
        } else if aggregate.summary.failed == total {
            MasterPhase::AllFailed
        } else {
            MasterPhase::CompletedWithErrors
        };
        self.monitor
            .write_master(job_id, git_url, |m| {
                m.phase = final_phase;
                m.completed_at = Some(Utc::now());
            })
            .await?;

        let (merged, project_results, failed_projects) = self.build_group_result(job_id, total).await;
        let response = ScanResultResponse::group(git_url.to_string(), &merged, project_results, failed_projects);
        self.registry.cache_response(job_id, response);

        if final_phase == MasterPhase::AllFailed {
            self.registry.set_error(job_id, "all repositories in the group failed to scan".to_string());
        } else {
            self.registry.set_result(job_id, merged);
        }

        Ok(())
    }

    /// Trivial accessor so the per-project task below can hold its own `Arc<JobMonitor>` without
    /// the Controller itself needing to be `Arc`.
    fn monitor_ref(&self) -> Arc<JobMonitor> {
        Arc::clone(&self.monitor)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_one_project(
        config: ScannerConfig,
        monitor: Arc<JobMonitor>,
        semaphore: Arc<Semaphore>,
        job_id: String,
        repo_index: u32,
        project: EnumeratedProject,
        registry: Arc<JobRegistry>,
        total: u32,
    ) {
        let _permit = match semaphore.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let log_dir = scanner_core::fs_layout::log_dir(&config.log_root, &job_id);
        let _ = tokio::fs::create_dir_all(&log_dir).await;

        match spawn_worker(&config.worker_binary, &job_id, repo_index, &project.name, &project.git_url, &log_dir) {
            Ok(handle) => {
                let stderr = handle.stderr_handle();
                if let Err(e) = monitor
                    .supervised_wait(handle.child, &job_id, repo_index, &project.name, config.worker_timeout, stderr)
                    .await
                {
                    tracing::warn!(job_id, repo_index, error = %e, "supervised wait failed");
                }
            }
            Err(e) => {
                // A project that failed to even spawn gets a synthesized
                // failure record.
                let _ = monitor
                    .write_failed_repo(&job_id, repo_index, &project.name, &format!("failed to spawn worker: {e}"), "")
                    .await;
            }
        }

        let aggregate = monitor.aggregate(&job_id).await;
        #[allow(clippy::cast_precision_loss)]
        let percentage = 10.0 + 85.0 * f64::from(aggregate.summary.completed + aggregate.summary.failed) / f64::from(total);
        registry.update_status(&job_id, percentage.min(95.0));
    }

    async fn spawn_and_wait(&self, job_id: &str, repo_index: u32, repo_name: &str, git_url: &str) -> Result<(), CoreError> {
        let log_dir = scanner_core::fs_layout::log_dir(&self.config.log_root, job_id);
        tokio::fs::create_dir_all(&log_dir).await.map_err(|e| CoreError::from_io_error(&e))?;

        let handle = spawn_worker(&self.config.worker_binary, job_id, repo_index, repo_name, git_url, &log_dir)
            .map_err(|e| CoreError::acquisition(format!("failed to spawn worker: {e}")))?;
        let stderr = handle.stderr_handle();

        let monitor = Arc::clone(&self.monitor);
        let poll_job_id = job_id.to_string();
        let poll_interval = self.config.poll_interval;
        let registry = Arc::clone(&self.registry);
        let poll_task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(poll_interval).await;
                let aggregate = monitor.aggregate(&poll_job_id).await;
                if aggregate.status.is_terminal() {
                    break;
                }
                let percentage = aggregate_percentage(&aggregate);
                registry.update_status(&poll_job_id, percentage);
            }
        });

        let wait_result = self
            .monitor
            .supervised_wait(handle.child, job_id, repo_index, repo_name, self.config.worker_timeout, stderr)
            .await;
        poll_task.abort();
        wait_result
    }

    async fn read_repo_status(&self, job_id: &str, repo_index: u32) -> Option<scanner_core::RepositoryStatus> {
        let path = scanner_core::fs_layout::repo_status_path(&self.config.job_root, job_id, repo_index);
        scanner_core::atomic::read_json_opt(&path).await.ok().flatten()
    }

    /// Build the merged group result and per-project breakdown from every `repo_<index>.json` on
    /// disk.
    async fn build_group_result(
        &self,
        job_id: &str,
        total: u32,
    ) -> (ScanResult, Vec<ProjectResult>, Vec<FailedProject>) {
        let mut merged = ScanResult::default();
        let mut project_results = Vec::new();
        let mut failed_projects = Vec::new();

        for index in 0..total {
            let Some(status) = self.read_repo_status(job_id, index).await else {
                continue;
            };
            match status.phase {
                scanner_core::Phase::Completed => {
                    let result = status.result.unwrap_or_default();
                    merged.merge_categories_any(&result);
                    project_results.push(ProjectResult {
                        project_name: status.name.clone(),
                        git_url: String::new(),
                        dependencies: result.dependency_categories.clone(),
                        infrastructure_usage: result.infrastructure_categories.clone(),
                        status: "success",
                        error: None,
                    });
                }
                _ => {
                    let message = status
                        .errors
                        .last()
                        .map_or_else(|| "unknown error".to_string(), |e| e.message.clone());
                    failed_projects.push(FailedProject {
                        project_name: status.name.clone(),
                        git_url: String::new(),
                        error: message.clone(),
                    });
                    project_results.push(ProjectResult {
                        project_name: status.name,
                        git_url: String::new(),
                        dependencies: std::collections::BTreeMap::new(),
                        infrastructure_usage: std::collections::BTreeMap::new(),
                        status: "failed",
                        error: Some(message),
                    });
                }
            }
        }

        (merged, project_results, failed_projects)
    }

    /// `Status(job_id)`: delegates to Monitor.Aggregate.
    pub async fn status(&self, job_id: &str) -> crate::job_monitor::AggregateRecord {
        self.monitor.aggregate(job_id).await
    }

    /// `Result(job_id)`: the Registry's cached response, or `not_ready`/`not_found` errors.
    pub fn result(&self, job_id: &str) -> Result<ScanResultResponse, CoreError> {
        let job = self.registry.get(job_id).ok_or_else(|| CoreError::not_found(job_id))?;
        match job.state {
            scanner_core::RegistryState::Completed => self
                .registry
                .get_response(job_id)
                .ok_or_else(|| CoreError::internal("completed job missing cached response")),
            scanner_core::RegistryState::Failed => Err(CoreError::not_ready(job_id, "failed")),
            scanner_core::RegistryState::Pending | scanner_core::RegistryState::Running => {
                Err(CoreError::not_ready(job_id, "running"))
            }
        }
    }

    /// `GET /jobs/{job_id}/partial`: a snapshot while running, built straight from the Monitor's
    /// live aggregate rather than the Registry. Never returned for jobs in terminal states.
    pub async fn partial(&self, job_id: &str) -> Result<crate::job_monitor::AggregateRecord, CoreError> {
        let job = self.registry.get(job_id).ok_or_else(|| CoreError::not_found(job_id))?;
        if !matches!(job.state, scanner_core::RegistryState::Pending | scanner_core::RegistryState::Running) {
            return Err(CoreError::not_ready(job_id, job.state.to_string()));
        }
        Ok(self.monitor.aggregate(job_id).await)
    }

    /// `ListJobs(page, per_page, status?)`.
    #[must_use]
    pub fn list_jobs(&self, page: usize, per_page: usize, status: Option<scanner_core::RegistryState>) -> JobPage {
        self.registry.list(page, per_page, status)
    }

    pub async fn cleanup_old_jobs(&self) -> Result<usize, CoreError> {
        self.monitor.cleanup_old_jobs(self.config.job_retention).await
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }
}

/// Single-repository progress-poll percentage: a straightforward pass-through of the Monitor's own
/// summary-derived completion fraction.
fn aggregate_percentage(aggregate: &crate::job_monitor::AggregateRecord) -> f64 {
    if aggregate.summary.total_repositories == 0 {
        return 0.0;
    }
    let done = aggregate.summary.completed + aggregate.summary.failed;
    100.0 * f64::from(done) / f64::from(aggregate.summary.total_repositories)
}

/// Derives a human-readable repository name from a Git URL for the single-repository path's
/// master/registry bookkeeping (no Group Enumerator is consulted for a lone repository).
fn repo_name_from_url(git_url: &str) -> String {
    git_url
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .rsplit('/')
        .next()
        .unwrap_or(git_url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_from_url_strips_git_suffix() {
        assert_eq!(repo_name_from_url("https://github.com/owner/repo.git"), "repo");
        assert_eq!(repo_name_from_url("https://gitlab.com/owner/repo/"), "repo");
    }
}

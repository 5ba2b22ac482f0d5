//! Job Monitor: the single source of truth for reading job state back out of the filesystem.
//! Stateless between calls — every call re-reads the directory.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use scanner_core::{
    atomic::{read_json_opt, write_json_atomic},
    CoreError, MasterPhase, MasterRecord, OverallStatus, Phase, ProgressSnapshot, RepositoryStatus,
};
use scanner_runtime::{shutdown_child, supervised_wait, ProcessOutcome};
use serde::Serialize;
use std::sync::Arc;
use tokio::process::Child;
use tokio::sync::Mutex;

/// Progress view embedded per in-flight repository in the aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct RepoProgressView {
    pub total_files: u64,
    pub current_file: u64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&ProgressSnapshot> for RepoProgressView {
    fn from(snapshot: &ProgressSnapshot) -> Self {
        Self {
            total_files: snapshot.observed_total,
            current_file: snapshot.processed,
            percentage: snapshot.percentage,
            current_file_name: snapshot.current_file_name.clone(),
            message: snapshot.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentRepositoryView {
    pub repo_name: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<RepoProgressView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRepositoryView {
    pub repo_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    pub total_repositories: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub pending: u32,
    pub failed: u32,
}

/// Response shape for `GET /scan/{job_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRecord {
    pub job_id: String,
    pub status: OverallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_url: Option<String>,
    pub summary: AggregateSummary,
    pub elapsed_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_repositories: Option<Vec<CurrentRepositoryView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_repositories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_repositories: Option<Vec<FailedRepositoryView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_repositories: Option<Vec<String>>,
}

/// Stale if `now - last_update` exceeds this.
pub struct JobMonitor {
    job_root: PathBuf,
    stale_threshold: Duration,
}

impl JobMonitor {
    #[must_use]
    pub fn new(job_root: PathBuf, stale_threshold: Duration) -> Self {
        Self {
            job_root,
            stale_threshold,
        }
    }

    fn job_dir(&self, job_id: &str) -> PathBuf {
        scanner_core::fs_layout::job_dir(&self.job_root, job_id)
    }

    fn master_path(&self, job_id: &str) -> PathBuf {
        scanner_core::fs_layout::master_path(&self.job_root, job_id)
    }

    fn repo_status_path(&self, job_id: &str, index: u32) -> PathBuf {
        scanner_core::fs_layout::repo_status_path(&self.job_root, job_id, index)
    }

    /// Lists every `repo_<index>.json` file currently on disk for `job_id` and parses it, skipping
    /// unparsable files.
    async fn read_all_repos(&self, job_id: &str) -> Vec<RepositoryStatus> {
        let dir = self.job_dir(job_id);
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            return Vec::new();
        };

        let mut statuses = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with("repo_") || !name.ends_with(".json") {
                continue;
            }
            match read_json_opt::<RepositoryStatus>(&entry.path()).await {
                Ok(Some(status)) => statuses.push(status),
                Ok(None) => {}
                Err(e) => tracing::warn!(job_id, file = %name, "skipping unparsable repo status: {e}"),
            }
        }
        statuses.sort_by_key(|s| s.index);
        statuses
    }

    /// Reads the master record and every repo status file, buckets repos by
    /// phase, and derives the overall job status.
    pub async fn aggregate(&self, job_id: &str) -> AggregateRecord {
        let dir = self.job_dir(job_id);
        if tokio::fs::metadata(&dir).await.is_err() {
            return AggregateRecord {
                job_id: job_id.to_string(),
                status: OverallStatus::NotFound,
                group_url: None,
                summary: AggregateSummary {
                    total_repositories: 0,
                    completed: 0,
                    in_progress: 0,
                    pending: 0,
                    failed: 0,
                },
                elapsed_time_seconds: 0.0,
                last_update: None,
                current_repositories: None,
                completed_repositories: None,
                failed_repositories: None,
                pending_repositories: None,
            };
        }

        let master: Option<MasterRecord> = read_json_opt(&self.master_path(job_id)).await.unwrap_or(None);
        let repos = self.read_all_repos(job_id).await;

        let completed: Vec<&RepositoryStatus> =
            repos.iter().filter(|r| r.phase == Phase::Completed).collect();
        let failed: Vec<&RepositoryStatus> = repos
            .iter()
            .filter(|r| matches!(r.phase, Phase::Failed | Phase::Timeout))
            .collect();
        let in_progress: Vec<&RepositoryStatus> =
            repos.iter().filter(|r| r.phase.is_in_progress()).collect();
        let initializing: Vec<&RepositoryStatus> =
            repos.iter().filter(|r| r.phase == Phase::Initializing).collect();

        #[allow(clippy::cast_possible_truncation)]
        let total = master
            .as_ref()
            .map_or(repos.len() as u32, |m| m.total_repositories);
        #[allow(clippy::cast_possible_truncation)]
        let completed_n = completed.len() as u32;
        #[allow(clippy::cast_possible_truncation)]
        let failed_n = failed.len() as u32;
        #[allow(clippy::cast_possible_truncation)]
        let in_progress_n = in_progress.len() as u32;
        #[allow(clippy::cast_possible_truncation)]
        let initializing_n = initializing.len() as u32;
        let pending = total.saturating_sub(completed_n + failed_n + in_progress_n + initializing_n);

        let overall_status = decide_overall_status(
            master.as_ref(),
            total,
            completed_n,
            failed_n,
            in_progress_n,
        );

        let started_at = master.as_ref().map(|m| m.started_at);
        let elapsed = started_at.map_or(0.0, |s| (Utc::now() - s).num_milliseconds() as f64 / 1000.0);
        let last_update = repos.iter().map(|r| r.last_update).max();

        let current_repositories = if in_progress.is_empty() {
            None
        } else {
            Some(
                in_progress
                    .iter()
                    .map(|r| CurrentRepositoryView {
                        repo_name: r.name.clone(),
                        status: r.phase.to_string(),
                        started_at: r.started_at,
                        progress: r.progress.as_ref().map(RepoProgressView::from),
                    })
                    .collect(),
            )
        };

        let completed_repositories = if completed.is_empty() {
            None
        } else {
            Some(completed.iter().map(|r| r.name.clone()).collect())
        };

        let failed_repositories = if failed.is_empty() {
            None
        } else {
            Some(
                failed
                    .iter()
                    .map(|r| FailedRepositoryView {
                        repo_name: r.name.clone(),
                        error: r
                            .errors
                            .last()
                            .map_or_else(|| "unknown error".to_string(), |e| e.message.clone()),
                    })
                    .collect(),
            )
        };

        let pending_repositories = master.as_ref().and_then(|m| {
            if m.pending.is_empty() {
                None
            } else {
                Some(m.pending.clone())
            }
        });

        AggregateRecord {
            job_id: job_id.to_string(),
            status: overall_status,
            group_url: master.as_ref().map(|m| m.group_url.clone()),
            summary: AggregateSummary {
                total_repositories: total,
                completed: completed_n,
                in_progress: in_progress_n,
                pending,
                failed: failed_n,
            },
            elapsed_time_seconds: elapsed,
            last_update,
            current_repositories,
            completed_repositories,
            failed_repositories,
            pending_repositories,
        }
    }

    /// Whether a repo's `last_update` is stale.
    #[must_use]
    pub fn is_stale(&self, last_update: DateTime<Utc>) -> bool {
        (Utc::now() - last_update).to_std().unwrap_or(Duration::ZERO) > self.stale_threshold
    }

    /// Merge-and-write the master file atomically: read the existing record (or build an
    /// `initializing` one), apply `mutate`, stamp `last_aggregation`, write.
    pub async fn write_master<F>(&self, job_id: &str, group_url: &str, mutate: F) -> Result<MasterRecord, CoreError>
    where
        F: FnOnce(&mut MasterRecord),
    {
        let path = self.master_path(job_id);
        let mut record = read_json_opt::<MasterRecord>(&path)
            .await?
            .unwrap_or_else(|| MasterRecord::initializing(group_url, Utc::now()));
        mutate(&mut record);
        record.last_aggregation = Some(Utc::now());
        write_json_atomic(&path, &record).await?;
        Ok(record)
    }

    /// Used by the Controller when a worker exited without writing its own terminal status.
    pub async fn write_failed_repo(
        &self,
        job_id: &str,
        repo_index: u32,
        repo_name: &str,
        message: &str,
        stderr: &str,
    ) -> Result<(), CoreError> {
        let path = self.repo_status_path(job_id, repo_index);
        let existing: Option<RepositoryStatus> = read_json_opt(&path).await?;
        if let Some(status) = &existing {
            if status.phase.is_terminal() {
                return Ok(());
            }
        }

        let now = Utc::now();
        let mut status = existing.unwrap_or_else(|| RepositoryStatus {
            index: repo_index,
            name: repo_name.to_string(),
            phase: Phase::Failed,
            pid: None,
            started_at: now,
            last_update: now,
            progress: None,
            errors: Vec::new(),
            result: None,
            completed_at: None,
        });
        status.phase = Phase::Failed;
        status.last_update = now;
        let mut error = scanner_core::RepoError::new(message, now);
        if !stderr.is_empty() {
            error = error.with_detail(stderr);
        }
        status.errors.push(error);
        write_json_atomic(&path, &status).await
    }

    /// Waits on a spawned Worker process and reconciles its on-disk status: on non-zero exit with a
    /// non-terminal on-disk status, writes a failure record; on timeout, kills the process and
    /// writes a `timeout` record. `stderr` is read only once the process has exited, so the failure
    /// record carries the full captured text rather than a partial snapshot.
    pub async fn supervised_wait(
        &self,
        child: Child,
        job_id: &str,
        repo_index: u32,
        repo_name: &str,
        timeout: Duration,
        stderr: Arc<Mutex<String>>,
    ) -> Result<(), CoreError> {
        match supervised_wait(child, timeout)
            .await
            .map_err(|e| CoreError::from_io_error(&e))?
        {
            ProcessOutcome::Exited(status) => {
                if status.success() {
                    return Ok(());
                }
                let captured_stderr = stderr.lock().await.clone();
                self.write_failed_repo(
                    job_id,
                    repo_index,
                    repo_name,
                    "Worker process exited with a non-zero status",
                    &captured_stderr,
                )
                .await
            }
            ProcessOutcome::TimedOut => {
                let path = self.repo_status_path(job_id, repo_index);
                let now = Utc::now();
                let mut status: RepositoryStatus = read_json_opt(&path).await?.unwrap_or_else(|| {
                    RepositoryStatus::starting(repo_index, repo_name.to_string(), 0, now)
                });
                status.phase = Phase::Timeout;
                status.last_update = now;
                status
                    .errors
                    .push(scanner_core::RepoError::new(CoreError::timeout(timeout.as_secs()).user_message(), now));
                write_json_atomic(&path, &status).await
            }
        }
    }

    /// Deletes job directories whose master `completed_at` (or, absent a master, directory mtime)
    /// is older than `age`.
    pub async fn cleanup_old_jobs(&self, age: Duration) -> Result<usize, CoreError> {
        let Ok(mut entries) = tokio::fs::read_dir(&self.job_root).await else {
            return Ok(0);
        };

        let cutoff = Utc::now() - chrono::Duration::from_std(age).unwrap_or(chrono::Duration::zero());
        let mut removed = 0usize;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let job_id = entry.file_name().to_string_lossy().into_owned();
            let master: Option<MasterRecord> = read_json_opt(&self.master_path(&job_id)).await.unwrap_or(None);

            let is_old = if let Some(master) = master {
                master.completed_at.is_some_and(|c| c < cutoff)
            } else {
                tokio::fs::metadata(entry.path())
                    .await
                    .and_then(|m| m.modified())
                    .map(|mtime| DateTime::<Utc>::from(mtime) < cutoff)
                    .unwrap_or(false)
            };

            if is_old && tokio::fs::remove_dir_all(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Forcibly terminate a still-running worker at job finalization.
pub async fn terminate_if_running(child: Child) {
    let _ = shutdown_child(child).await;
}

/// Overall-status decision table (first match wins).
fn decide_overall_status(
    master: Option<&MasterRecord>,
    total: u32,
    completed: u32,
    failed: u32,
    in_progress: u32,
) -> OverallStatus {
    if let Some(master) = master {
        match master.phase {
            MasterPhase::Failed => return OverallStatus::Failed,
            MasterPhase::Timeout => return OverallStatus::Timeout,
            MasterPhase::Cancelled => return OverallStatus::Cancelled,
            _ => {}
        }
    }

    let sum_done = completed + failed;
    let master_final = master.is_some_and(|m| m.phase.is_final());

    if sum_done >= total && total > 0 {
        if !master_final {
            return OverallStatus::Processing;
        }
        return if failed == 0 {
            OverallStatus::Completed
        } else if failed == total {
            OverallStatus::AllFailed
        } else {
            OverallStatus::CompletedWithErrors
        };
    }

    if in_progress > 0 {
        return OverallStatus::InProgress;
    }
    if completed > 0 || failed > 0 {
        return OverallStatus::InProgress;
    }
    OverallStatus::Initializing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master(phase: MasterPhase, total: u32) -> MasterRecord {
        MasterRecord {
            group_url: "https://example.com/g".into(),
            total_repositories: total,
            pending: Vec::new(),
            completed: Vec::new(),
            failed: Vec::new(),
            phase,
            started_at: Utc::now(),
            completed_at: None,
            last_aggregation: None,
        }
    }

    /// Repos all done but master not yet finalized.
    #[test]
    fn master_not_final_yields_processing() {
        let m = master(MasterPhase::Initializing, 1);
        let status = decide_overall_status(Some(&m), 1, 1, 0, 0);
        assert_eq!(status, OverallStatus::Processing);
    }

    #[test]
    fn all_completed_with_final_master_is_completed() {
        let m = master(MasterPhase::Completed, 1);
        let status = decide_overall_status(Some(&m), 1, 1, 0, 0);
        assert_eq!(status, OverallStatus::Completed);
    }

    /// A group scan where one repository failed.
    #[test]
    fn group_with_one_failure_is_completed_with_errors() {
        let m = master(MasterPhase::CompletedWithErrors, 3);
        let status = decide_overall_status(Some(&m), 3, 2, 1, 0);
        assert_eq!(status, OverallStatus::CompletedWithErrors);
    }

    /// A single-repository job where the one repository failed.
    #[test]
    fn all_failed_when_every_repo_failed() {
        let m = master(MasterPhase::AllFailed, 1);
        let status = decide_overall_status(Some(&m), 1, 0, 1, 0);
        assert_eq!(status, OverallStatus::AllFailed);
    }

    #[test]
    fn missing_master_with_no_repos_is_initializing() {
        let status = decide_overall_status(None, 0, 0, 0, 0);
        assert_eq!(status, OverallStatus::Initializing);
    }

    #[test]
    fn in_progress_repos_are_in_progress() {
        let m = master(MasterPhase::InProgress, 2);
        let status = decide_overall_status(Some(&m), 2, 0, 0, 1);
        assert_eq!(status, OverallStatus::InProgress);
    }
}

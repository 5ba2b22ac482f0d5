//! Job, RepositoryStatus and MasterRecord.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::{Phase, RegistryState};
use super::progress::ProgressSnapshot;
use super::scan_result::ScanResult;

/// One error entry recorded against a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoError {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Captured exception text / stack trace, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RepoError {
    #[must_use]
    pub fn new(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            timestamp: now,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// The content of one `repo_<index>.json` file. Owned by exactly one Worker process for its
/// lifetime; the Controller (via the Monitor) writes the failed variant only after that worker has
/// exited without producing a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryStatus {
    pub index: u32,
    pub name: String,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSnapshot>,
    #[serde(default)]
    pub errors: Vec<RepoError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RepositoryStatus {
    #[must_use]
    pub fn starting(index: u32, name: impl Into<String>, pid: u32, now: DateTime<Utc>) -> Self {
        Self {
            index,
            name: name.into(),
            phase: Phase::Starting,
            pid: Some(pid),
            started_at: now,
            last_update: now,
            progress: None,
            errors: Vec::new(),
            result: None,
            completed_at: None,
        }
    }
}

/// One failed-repository entry in `MasterRecord.failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRepo {
    pub name: String,
    pub error: String,
}

/// Job-level phase override persisted in `master.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterPhase {
    Initializing,
    InProgress,
    Completed,
    CompletedWithErrors,
    AllFailed,
    Failed,
    Timeout,
    Cancelled,
}

impl MasterPhase {
    /// Whether this value represents a finalized master record.
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Initializing | Self::InProgress)
    }
}

/// The content of `master.json`. Owned by the Controller; the Monitor only stamps
/// `last_aggregation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterRecord {
    pub group_url: String,
    pub total_repositories: u32,
    #[serde(default)]
    pub pending: Vec<String>,
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub failed: Vec<FailedRepo>,
    pub phase: MasterPhase,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_aggregation: Option<DateTime<Utc>>,
}

impl MasterRecord {
    #[must_use]
    pub fn initializing(group_url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            group_url: group_url.into(),
            total_repositories: 0,
            pending: Vec::new(),
            completed: Vec::new(),
            failed: Vec::new(),
            phase: MasterPhase::Initializing,
            started_at: now,
            completed_at: None,
            last_aggregation: None,
        }
    }
}

/// In-memory Registry record. Owned by the Registry: created on submit, mutated by the Controller
/// and Monitor, never destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub submission_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_at: Option<DateTime<Utc>>,
    pub state: RegistryState,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub repository_names: Vec<String>,
}

impl Job {
    #[must_use]
    pub fn new(job_id: impl Into<String>, submission_url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.into(),
            submission_url: submission_url.into(),
            created_at: now,
            terminal_at: None,
            state: RegistryState::Pending,
            percentage: 0.0,
            result: None,
            error: None,
            repository_names: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_phase_finality_matches_terminal_states() {
        assert!(!MasterPhase::Initializing.is_final());
        assert!(!MasterPhase::InProgress.is_final());
        assert!(MasterPhase::Completed.is_final());
        assert!(MasterPhase::CompletedWithErrors.is_final());
        assert!(MasterPhase::AllFailed.is_final());
        assert!(MasterPhase::Failed.is_final());
        assert!(MasterPhase::Timeout.is_final());
        assert!(MasterPhase::Cancelled.is_final());
    }
}

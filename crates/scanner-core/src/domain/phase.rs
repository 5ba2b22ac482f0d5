//! Phase and status enumerations shared by the Worker, Monitor and Controller.

use serde::{Deserialize, Serialize};

/// Fine-grained Worker state written into `repo_<index>.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Starting,
    Downloading,
    Extracting,
    Cloning,
    Scanning,
    Analyzing,
    Completed,
    Failed,
    Timeout,
}

impl Phase {
    /// Phases that count as "in progress" for the Monitor's bucketing.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(
            self,
            Self::Starting
                | Self::Cloning
                | Self::Scanning
                | Self::Analyzing
                | Self::Downloading
                | Self::Extracting
        )
    }

    /// Terminal phases: once reached, the status file is never overwritten by further scanner
    /// progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Timeout)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initializing => "initializing",
            Self::Starting => "starting",
            Self::Downloading => "downloading",
            Self::Extracting => "extracting",
            Self::Cloning => "cloning",
            Self::Scanning => "scanning",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Coarse, derived job-level state computed by the Monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Initializing,
    InProgress,
    /// Every repo finished but the Controller has not finalized `master.json` yet.
    Processing,
    Completed,
    CompletedWithErrors,
    AllFailed,
    Failed,
    Timeout,
    Cancelled,
    NotFound,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initializing => "initializing",
            Self::InProgress => "in_progress",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::AllFailed => "all_failed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

impl OverallStatus {
    /// Whether this status is terminal — the job will not transition further.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::CompletedWithErrors
                | Self::AllFailed
                | Self::Failed
                | Self::Timeout
                | Self::Cancelled
        )
    }
}

/// Coarser lifecycle states tracked by the Registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RegistryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_progress_phases_cover_active_work_phases() {
        for p in [
            Phase::Starting,
            Phase::Cloning,
            Phase::Scanning,
            Phase::Analyzing,
            Phase::Downloading,
            Phase::Extracting,
        ] {
            assert!(p.is_in_progress());
        }
        assert!(!Phase::Initializing.is_in_progress());
        assert!(!Phase::Completed.is_in_progress());
    }

    #[test]
    fn terminal_phases_never_overwritten() {
        assert!(Phase::Completed.is_terminal());
        assert!(Phase::Failed.is_terminal());
        assert!(Phase::Timeout.is_terminal());
        assert!(!Phase::Scanning.is_terminal());
    }
}

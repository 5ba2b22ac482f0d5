//! Core error taxonomy. Designed to be serializable across process boundaries: a Worker process
//! embeds these in its status file, and the HTTP layer maps them to status codes. No dependence on
//! non-serializable types like `std::io::Error` — I/O errors capture kind and message as strings
//! instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type shared by every component that can fail a job or a repository.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoreError {
    /// URL failed syntactic or security validation.
    #[error("Invalid Git URL: {message}")]
    InvalidUrl { message: String },

    /// Download or extraction failed.
    #[error("Repository acquisition failed: {message}")]
    Acquisition { message: String },

    /// A scanner collaborator raised an exception.
    #[error("Scanner failed: {message}")]
    Scanner { message: String },

    /// Worker exceeded its wall-clock budget.
    #[error("Process killed after {seconds} seconds timeout")]
    Timeout { seconds: u64 },

    /// Submit rejected because the service is at its concurrent-job cap.
    #[error("Too many concurrent jobs (limit {limit})")]
    TooManyJobs { limit: usize },

    /// Job id unknown to the Registry/Monitor.
    #[error("Job not found: {job_id}")]
    NotFound { job_id: String },

    /// Result requested before the job reached a terminal status.
    #[error("Job not ready: {job_id} is still {status}")]
    NotReady { job_id: String, status: String },

    /// I/O error during status-file or archive handling.
    #[error("I/O error ({kind}): {message}")]
    Io { kind: String, message: String },

    /// Everything unclassified. Never leaks stack traces to a client.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    #[must_use]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn acquisition(message: impl Into<String>) -> Self {
        Self::Acquisition {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn scanner(message: impl Into<String>) -> Self {
        Self::Scanner {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    #[must_use]
    pub const fn too_many_jobs(limit: usize) -> Self {
        Self::TooManyJobs { limit }
    }

    #[must_use]
    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self::NotFound {
            job_id: job_id.into(),
        }
    }

    #[must_use]
    pub fn not_ready(job_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self::NotReady {
            job_id: job_id.into(),
            status: status.into(),
        }
    }

    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is specific to one repository and must not abort the rest of a group.
    #[must_use]
    pub const fn is_repo_scoped(&self) -> bool {
        matches!(
            self,
            Self::Acquisition { .. } | Self::Scanner { .. } | Self::Timeout { .. }
        )
    }

    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidUrl { message } => format!("Invalid URL: {message}"),
            Self::Acquisition { message } => format!("Could not acquire repository: {message}"),
            Self::Scanner { message } => format!("Scan failed: {message}"),
            Self::Timeout { seconds } => format!("Process killed after {seconds} seconds timeout"),
            Self::TooManyJobs { limit } => {
                format!("Too many concurrent jobs (limit {limit}). Try again later.")
            }
            Self::NotFound { job_id } => format!("Job {job_id} was not found."),
            Self::NotReady { job_id, status } => {
                format!("Job {job_id} is not ready yet (status: {status}).")
            }
            Self::Io { message, .. } => format!("File operation failed: {message}"),
            Self::Internal { .. } => "An internal error occurred.".to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_round_trip() {
        let err = CoreError::timeout(3600);
        let json = serde_json::to_string(&err).unwrap();
        let parsed: CoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn repo_scoped_errors_do_not_include_submit_time_errors() {
        assert!(CoreError::acquisition("x").is_repo_scoped());
        assert!(CoreError::scanner("x").is_repo_scoped());
        assert!(CoreError::timeout(10).is_repo_scoped());
        assert!(!CoreError::invalid_url("x").is_repo_scoped());
        assert!(!CoreError::too_many_jobs(5).is_repo_scoped());
    }

    #[test]
    fn internal_user_message_never_leaks_detail() {
        let err = CoreError::internal("panic at src/worker.rs:42: unwrap on None");
        assert_eq!(err.user_message(), "An internal error occurred.");
    }
}

//! CLI-facing error type with a sysexits-style `exit_code` mapping
//! so `main` can translate a failure into a process exit status.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] scanner_core::CoreError),
    #[error("request to scanner service failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// sysexits.h-style exit codes.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Request(_) => 69,  // EX_UNAVAILABLE
            Self::Other(_) => 70,    // EX_SOFTWARE
        }
    }
}

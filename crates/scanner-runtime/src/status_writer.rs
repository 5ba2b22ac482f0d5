//! Throttled atomic status-file writer. Wraps [`scanner_core::write_json_atomic`] with the Worker's
//! write policy: at least once per phase transition (forced), and at least once every
//! `PROGRESS_INTERVAL` while in a work phase, with an additional forced write whenever `stage_index
//! == stage_total`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use scanner_core::{write_json_atomic, CoreError, RepositoryStatus};

/// Tracks the last-write time for one repository's status file so callers can decide whether a
/// given update needs to hit the filesystem.
pub struct StatusWriter {
    path: PathBuf,
    interval: Duration,
    last_write: Option<Instant>,
}

impl StatusWriter {
    #[must_use]
    pub fn new(path: PathBuf, interval: Duration) -> Self {
        Self {
            path,
            interval,
            last_write: None,
        }
    }

    /// Write unconditionally, e.g. on phase transitions or terminal status.
    pub async fn write_forced(&mut self, status: &RepositoryStatus) -> Result<(), CoreError> {
        write_json_atomic(&self.path, status).await?;
        self.last_write = Some(Instant::now());
        Ok(())
    }

    /// Write if the throttle interval has elapsed since the last write, or `force` is set. Returns
    /// whether a write happened.
    pub async fn write_throttled(
        &mut self,
        status: &RepositoryStatus,
        force: bool,
    ) -> Result<bool, CoreError> {
        let due = self
            .last_write
            .map_or(true, |last| last.elapsed() >= self.interval);
        if force || due {
            self.write_forced(status).await?;
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_status() -> RepositoryStatus {
        RepositoryStatus::starting(0, "repo", 123, Utc::now())
    }

    #[tokio::test]
    async fn first_write_always_happens() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = StatusWriter::new(dir.path().join("repo_0.json"), Duration::from_secs(60));
        let wrote = writer.write_throttled(&sample_status(), false).await.unwrap();
        assert!(wrote);
    }

    #[tokio::test]
    async fn second_write_is_suppressed_within_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = StatusWriter::new(dir.path().join("repo_0.json"), Duration::from_secs(60));
        writer.write_throttled(&sample_status(), false).await.unwrap();
        let wrote_again = writer.write_throttled(&sample_status(), false).await.unwrap();
        assert!(!wrote_again);
    }

    #[tokio::test]
    async fn forced_write_bypasses_throttle() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = StatusWriter::new(dir.path().join("repo_0.json"), Duration::from_secs(60));
        writer.write_throttled(&sample_status(), false).await.unwrap();
        let wrote_again = writer.write_throttled(&sample_status(), true).await.unwrap();
        assert!(wrote_again);
    }
}

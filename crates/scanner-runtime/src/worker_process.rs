//! Spawns the `scan-worker` binary per the invocation contract and captures its stderr so the
//! Controller can attach diagnostics to a synthesized failure record if the worker never writes its
//! own status.

use std::path::Path;
use std::sync::Arc;

use scanner_core::SCAN_JOB_LOG_DIR_ENV;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::debug;

/// Cap on retained captured stderr text, so a runaway worker can't grow unbounded memory in the
/// Controller process.
const MAX_CAPTURED_STDERR: usize = 16 * 1024;

/// A spawned worker process plus its captured stderr, shared with the background task draining the
/// pipe.
pub struct WorkerHandle {
    pub child: Child,
    stderr: Arc<Mutex<String>>,
}

impl WorkerHandle {
    /// Snapshot of captured stderr text so far.
    pub async fn captured_stderr(&self) -> String {
        self.stderr.lock().await.clone()
    }

    /// A cheap clone of the shared stderr buffer, so a caller can move `self.child` out for waiting
    /// and still read the final captured text once the process (and its stderr-draining task) has
    /// finished.
    #[must_use]
    pub fn stderr_handle(&self) -> Arc<Mutex<String>> {
        Arc::clone(&self.stderr)
    }
}

/// Spawn one Worker for `repo_index`/`repo_name`/`git_url` within `job_id`. `log_dir` is exposed to
/// the worker via `SCAN_JOB_LOG_DIR`; standard error is piped back and captured here.
pub fn spawn_worker(
    worker_binary: &Path,
    job_id: &str,
    repo_index: u32,
    repo_name: &str,
    git_url: &str,
    log_dir: &Path,
) -> std::io::Result<WorkerHandle> {
    let mut cmd = Command::new(worker_binary);
    cmd.arg(job_id)
        .arg(repo_index.to_string())
        .arg(repo_name)
        .arg(git_url)
        .env(SCAN_JOB_LOG_DIR_ENV, log_dir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped());

    let mut child = cmd.spawn()?;
    let stderr_buf = Arc::new(Mutex::new(String::new()));

    if let Some(stderr) = child.stderr.take() {
        let buf = Arc::clone(&stderr_buf);
        let index = repo_index;
        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                debug!(repo_index = %index, "worker stderr: {}", line);
                let mut guard = buf.lock().await;
                if guard.len() < MAX_CAPTURED_STDERR {
                    guard.push_str(&line);
                    guard.push('\n');
                }
            }
        });
    }

    Ok(WorkerHandle {
        child,
        stderr: stderr_buf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_worker_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-worker.sh");
        std::fs::write(&script, "#!/bin/sh\necho boom >&2\nexit 1\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let mut handle = spawn_worker(&script, "job-1", 0, "repo", "https://example.com/a/b", dir.path())
            .expect("spawn failed");
        let status = handle.child.wait().await.unwrap();
        assert!(!status.success());

        // give the background reader task a moment to drain the pipe
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(handle.captured_stderr().await.contains("boom"));
    }
}

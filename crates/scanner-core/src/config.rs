//! Service configuration. Constructed once at service start and threaded through via dependency
//! injection as a single composition-root struct.

use std::path::PathBuf;
use std::time::Duration;

/// Default directory under which job state is written.
pub const DEFAULT_JOB_ROOT: &str = "tmp/scan_jobs";
/// Default directory under which Worker process logs are written.
pub const DEFAULT_LOG_ROOT: &str = "tmp/scan_logs";

/// Job-level cap on concurrent subprocesses within one group scan.
pub const DEFAULT_MAX_CONCURRENT_PROCESSES: usize = 5;
/// Per-worker wall-clock budget before `SupervisedWait` kills the process.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(3600);
/// How often the Worker must write its status file while in a work phase.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);
/// How often the Controller's poll loop re-aggregates while a job runs.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// A status is stale if `now - last_update` exceeds this.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(120);
/// Default age threshold for `CleanupOldJobs`.
pub const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(24 * 3600);
/// Default Cache capacity.
pub const DEFAULT_CACHE_SIZE: usize = 50;
/// Default Cache entry TTL.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
/// Default service-level cap on concurrently running jobs.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 20;
/// Name of the env var that overrides the categorizer config path.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
/// Name of the env var a Worker reads for its process-log directory.
pub const SCAN_JOB_LOG_DIR_ENV: &str = "SCAN_JOB_LOG_DIR";

/// Single configuration struct threaded through the whole service.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Root of `tmp/scan_jobs/<job_id>/...`.
    pub job_root: PathBuf,
    /// Root of `tmp/scan_logs/<job_id>/...`.
    pub log_root: PathBuf,
    /// Path to the `scan-worker` binary the Controller spawns.
    pub worker_binary: PathBuf,
    pub max_concurrent_processes: usize,
    pub max_concurrent_jobs: usize,
    pub worker_timeout: Duration,
    pub progress_interval: Duration,
    pub poll_interval: Duration,
    pub stale_threshold: Duration,
    pub job_retention: Duration,
    pub cache_size: usize,
    pub cache_ttl: Duration,
    /// Resolved categorizer config path (CONFIG_PATH env, else a bundled default).
    pub categorizer_config_path: PathBuf,
}

impl ScannerConfig {
    /// Build configuration from environment variables, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let job_root = std::env::var("SCAN_JOB_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_JOB_ROOT));
        let log_root = std::env::var("SCAN_LOG_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_ROOT));
        let worker_binary = std::env::var("SCAN_WORKER_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("scan-worker"));
        let categorizer_config_path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/categories.yaml"));

        Self {
            job_root,
            log_root,
            worker_binary,
            max_concurrent_processes: DEFAULT_MAX_CONCURRENT_PROCESSES,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            job_retention: DEFAULT_JOB_RETENTION,
            cache_size: DEFAULT_CACHE_SIZE,
            cache_ttl: DEFAULT_CACHE_TTL,
            categorizer_config_path,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ScannerConfig {
            job_root: PathBuf::from(DEFAULT_JOB_ROOT),
            log_root: PathBuf::from(DEFAULT_LOG_ROOT),
            worker_binary: PathBuf::from("scan-worker"),
            max_concurrent_processes: DEFAULT_MAX_CONCURRENT_PROCESSES,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            job_retention: DEFAULT_JOB_RETENTION,
            cache_size: DEFAULT_CACHE_SIZE,
            cache_ttl: DEFAULT_CACHE_TTL,
            categorizer_config_path: PathBuf::from("config/categories.yaml"),
        };
        assert_eq!(cfg.max_concurrent_processes, 5);
        assert_eq!(cfg.worker_timeout, Duration::from_secs(3600));
        assert_eq!(cfg.stale_threshold, Duration::from_secs(120));
    }
}

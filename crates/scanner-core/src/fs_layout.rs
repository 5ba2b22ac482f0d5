//! Filesystem layout helpers. ```text tmp/scan_jobs/<job_id>/master.json
//! tmp/scan_jobs/<job_id>/repo_<index>.json tmp/scan_logs/<job_id>/<pid>.log ``` Directory creation
//! is idempotent.

use std::path::{Path, PathBuf};

#[must_use]
pub fn job_dir(job_root: &Path, job_id: &str) -> PathBuf {
    job_root.join(job_id)
}

#[must_use]
pub fn master_path(job_root: &Path, job_id: &str) -> PathBuf {
    job_dir(job_root, job_id).join("master.json")
}

#[must_use]
pub fn repo_status_path(job_root: &Path, job_id: &str, index: u32) -> PathBuf {
    job_dir(job_root, job_id).join(format!("repo_{index}.json"))
}

#[must_use]
pub fn log_dir(log_root: &Path, job_id: &str) -> PathBuf {
    log_root.join(job_id)
}

#[must_use]
pub fn worker_log_path(log_root: &Path, job_id: &str, pid: u32) -> PathBuf {
    log_dir(log_root, job_id).join(format!("{pid}.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_expected_paths() {
        let root = PathBuf::from("tmp/scan_jobs");
        assert_eq!(
            master_path(&root, "job-1"),
            PathBuf::from("tmp/scan_jobs/job-1/master.json")
        );
        assert_eq!(
            repo_status_path(&root, "job-1", 3),
            PathBuf::from("tmp/scan_jobs/job-1/repo_3.json")
        );
    }
}

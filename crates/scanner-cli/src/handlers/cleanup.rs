//! `scanner cleanup`: remove job directories older than the configured retention, without needing a
//! running service.

use scanner_core::ScannerConfig;
use scanner_http::JobMonitor;

use crate::error::CliError;

pub async fn execute() -> Result<(), CliError> {
    let config = ScannerConfig::from_env();
    let monitor = JobMonitor::new(config.job_root.clone(), config.stale_threshold);

    let removed = monitor.cleanup_old_jobs(config.job_retention).await?;
    println!("removed {removed} job director{} older than retention", if removed == 1 { "y" } else { "ies" });
    Ok(())
}

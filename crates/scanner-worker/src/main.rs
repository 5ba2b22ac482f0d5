//! `scan-worker` binary entry point:
//!
//! ```text
//! scan-worker <job-id> <repo-index> <repo-name> <git-url>
//! ```
//!
//! Writes process logs to both stderr and a per-PID log file under `SCAN_JOB_LOG_DIR`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use scanner_acquire::{Acquirer, Cache};
use scanner_core::{fs_layout, ScannerConfig};
use scanner_worker::{FileSystemScanner, WorkerArgs, YamlCategorizer};
use tracing_subscriber::EnvFilter;

/// One Worker process scans exactly one repository and exits.
#[derive(Parser, Debug)]
#[command(name = "scan-worker")]
struct Cli {
    job_id: String,
    repo_index: u32,
    repo_name: String,
    git_url: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = ScannerConfig::from_env();

    let log_dir = fs_layout::log_dir(&config.log_root, &cli.job_id);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("warning: failed to create log dir {}: {e}", log_dir.display());
    }
    let log_path = fs_layout::worker_log_path(&config.log_root, &cli.job_id, std::process::id());
    init_logging(&log_path);

    let status_path = fs_layout::repo_status_path(&config.job_root, &cli.job_id, cli.repo_index);
    if let Some(parent) = status_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!("failed to create job dir {}: {e}", parent.display());
            std::process::exit(1);
        }
    }

    let cache = Arc::new(Cache::new(config.cache_size, config.cache_ttl));
    let work_root = std::env::temp_dir().join("scan_work").join(&cli.job_id);
    let acquirer = Acquirer::new(cache, work_root);
    let scanner = FileSystemScanner::new();
    let categorizer = YamlCategorizer::from_path(&config.categorizer_config_path)
        .unwrap_or_else(|e| {
            tracing::warn!(
                path = %config.categorizer_config_path.display(),
                "no categorizer config, falling back to empty catalog: {e}"
            );
            YamlCategorizer::empty()
        });

    let args = WorkerArgs {
        job_id: cli.job_id,
        repo_index: cli.repo_index,
        repo_name: cli.repo_name,
        git_url: cli.git_url,
        status_path,
        progress_interval: config.progress_interval,
    };

    let code = scanner_worker::run(args, &acquirer, &scanner, &categorizer).await;
    std::process::exit(code);
}

/// Writes structured logs to stderr and to the per-PID worker log file under `SCAN_JOB_LOG_DIR`,
/// mirroring `setup_worker_logging`.
fn init_logging(log_path: &PathBuf) {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match file {
        Some(file) => subscriber
            .with_writer(move || file.try_clone().expect("log file handle"))
            .init(),
        None => subscriber.init(),
    }
}

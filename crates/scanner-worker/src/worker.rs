//! Scan Worker sequence: one process per repository. The phase sequence (starting -> downloading
//! -> extracting -> scanning -> completed), the force-write-on-every-transition discipline, and
//! the always-cleanup-regardless-of-outcome cleanup path are expressed here as explicit `Result`
//! propagation rather than exceptions.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use scanner_acquire::Acquirer;
use scanner_core::{
    CoreError, Dependency, Phase, ProgressEvent, ProgressSnapshot, RepoError, RepositoryStatus,
    ScanResult,
};
use scanner_core::{Categorizer, Scanner};
use scanner_runtime::{ProgressAggregator, StatusWriter};
use tracing::{debug, error, info};

/// Everything one Worker invocation needs: where to write its status file, its collaborators, and
/// the throttle interval.
pub struct WorkerArgs {
    pub job_id: String,
    pub repo_index: u32,
    pub repo_name: String,
    pub git_url: String,
    pub status_path: PathBuf,
    pub progress_interval: Duration,
}

/// Runs the full Worker sequence and returns the process exit code.
pub async fn run(
    args: WorkerArgs,
    acquirer: &Acquirer,
    scanner: &dyn Scanner,
    categorizer: &dyn Categorizer,
) -> i32 {
    let pid = std::process::id();
    let now = Utc::now();
    let mut status = RepositoryStatus::starting(args.repo_index, args.repo_name.clone(), pid, now);
    let mut writer = StatusWriter::new(args.status_path.clone(), args.progress_interval);

    // Step 1: write `starting` status (force write).
    if let Err(e) = writer.write_forced(&status).await {
        error!(job_id = %args.job_id, repo_index = args.repo_index, "failed to write initial status: {e}");
        return 1;
    }

    match scan_repository(&args, acquirer, scanner, categorizer, &mut status, &mut writer).await {
        Ok(()) => {
            info!(job_id = %args.job_id, repo_index = args.repo_index, "repository scan completed");
            0
        }
        Err(err) => {
            fail_with_error(&mut status, &mut writer, &err).await;
            error!(job_id = %args.job_id, repo_index = args.repo_index, "scan failed: {err}");
            1
        }
    }
}

/// Runs the acquire/scan sequence and guarantees cleanup regardless of outcome.
async fn scan_repository(
    args: &WorkerArgs,
    acquirer: &Acquirer,
    scanner: &dyn Scanner,
    categorizer: &dyn Categorizer,
    status: &mut RepositoryStatus,
    writer: &mut StatusWriter,
) -> Result<(), CoreError> {
    let mut acquired_path: Option<PathBuf> = None;

    let result = scan_inner(args, acquirer, scanner, categorizer, status, writer, &mut acquired_path).await;

    if let Some(path) = acquired_path {
        if let Err(e) = acquirer.cleanup(&path).await {
            tracing::warn!(path = %path.display(), "failed to clean up repository: {e}");
        }
    }

    result
}

#[allow(clippy::too_many_arguments)]
async fn scan_inner(
    args: &WorkerArgs,
    acquirer: &Acquirer,
    scanner: &dyn Scanner,
    categorizer: &dyn Categorizer,
    status: &mut RepositoryStatus,
    writer: &mut StatusWriter,
    acquired_path: &mut Option<PathBuf>,
) -> Result<(), CoreError> {
    // Step 2 (URL validation) happens inside `Acquirer::acquire`.
    // Step 3: downloading.
    status.phase = Phase::Downloading;
    status.last_update = Utc::now();
    writer.write_forced(status).await?;

    let job_id = args.job_id.clone();
    let repo_index = args.repo_index;
    let on_bytes = move |n: u64| {
        debug!(job_id = %job_id, repo_index, bytes_downloaded = n, "download progress");
    };
    let job_id = args.job_id.clone();
    let on_extracted = move |i: u64, n: u64| {
        debug!(job_id = %job_id, repo_index, files_extracted = i, total_files = n, "extraction progress");
    };

    let path = acquirer
        .acquire(&args.git_url, &on_bytes, &on_extracted)
        .await
        .map_err(|e| CoreError::acquisition(e.to_string()))?;
    *acquired_path = Some(path.clone());

    // Step 4: extracting (the acquirer performs download+extract as one
    // call; the phase transition is recorded once acquisition succeeds).
    status.phase = Phase::Extracting;
    status.last_update = Utc::now();
    writer.write_forced(status).await?;

    // Step 5: validate tree.
    if !Acquirer::validate_tree(&path) {
        return Err(CoreError::acquisition("repository tree is empty"));
    }

    // Step 6: scanning.
    status.phase = Phase::Scanning;
    status.last_update = Utc::now();
    writer.write_forced(status).await?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
    let on_progress = move |event: ProgressEvent| {
        let _ = tx.send(event);
    };

    let mut aggregator = ProgressAggregator::new();
    let scan_future = scanner.scan_project(&path, &on_progress);
    tokio::pin!(scan_future);

    // Drain progress events as the scan emits them, writing a throttled status update per
    // event, instead of waiting for the whole scan to resolve before the first write.
    let mut scan_output = None;
    while scan_output.is_none() || !rx.is_empty() {
        tokio::select! {
            biased;
            Some(event) = rx.recv() => {
                let snapshot = aggregator.update(&event);
                status.progress = Some(snapshot);
                status.last_update = Utc::now();
                writer.write_throttled(status, false).await?;
            }
            res = &mut scan_future, if scan_output.is_none() => {
                scan_output = Some(res.map_err(|e| CoreError::scanner(e.to_string()))?);
            }
        }
    }
    let output = scan_output.expect("loop only exits once the scan result is set");

    // On scanner completion, emit a synthetic event with stage=finalizing,
    // percentage=100, so the final status write always shows full progress.
    let final_snapshot = aggregator.update(&ProgressEvent::for_stage("finalizing"));
    let final_snapshot = ProgressSnapshot::finalizing(final_snapshot.processed);
    status.progress = Some(final_snapshot);
    status.last_update = Utc::now();
    writer.write_forced(status).await?;

    // Step 7: categorize dependencies and build the categorized views.
    let dependencies: std::collections::BTreeSet<_> = output.dependencies.into_iter().collect();
    let infrastructure: std::collections::BTreeSet<_> = output.infrastructure.into_iter().collect();
    let dependency_categories = categorize_flags(categorizer, &dependencies);
    let infrastructure_categories = infra_category_flags(&infrastructure);

    let result = ScanResult {
        dependencies,
        api_calls: output.api_calls.into_iter().collect(),
        infrastructure,
        dependency_categories,
        infrastructure_categories,
    };

    // Step 8: completed.
    status.phase = Phase::Completed;
    status.result = Some(result);
    status.completed_at = Some(Utc::now());
    status.last_update = Utc::now();
    writer.write_forced(status).await?;

    Ok(())
}

fn infra_category_flags(
    infra: &std::collections::BTreeSet<scanner_core::InfrastructureComponent>,
) -> BTreeMap<String, bool> {
    let mut flags = BTreeMap::new();
    for component in infra {
        flags.insert(component.kind.clone(), true);
    }
    flags
}

fn categorize_flags(
    categorizer: &dyn Categorizer,
    deps: &std::collections::BTreeSet<Dependency>,
) -> BTreeMap<String, bool> {
    let deps: Vec<Dependency> = deps.iter().cloned().collect();
    let mut flags: BTreeMap<String, bool> = categorizer
        .categories()
        .iter()
        .map(|c| (c.clone(), false))
        .collect();

    let categorized = categorizer.categorize_dependencies(&deps);
    for (category, entries) in categorized {
        if !entries.is_empty() {
            flags.insert(category, true);
        }
    }
    flags
}

/// Failure path. Always force-writes.
async fn fail_with_error(status: &mut RepositoryStatus, writer: &mut StatusWriter, err: &CoreError) {
    let now = Utc::now();
    status.phase = Phase::Failed;
    status.errors.push(RepoError::new(err.user_message(), now).with_detail(err.to_string()));
    status.last_update = now;
    if let Err(write_err) = writer.write_forced(status).await {
        error!("failed to write failure status: {write_err}");
    }
}

//! Composition root. The only place where concrete collaborator implementations are wired
//! together: build every service exactly once, pass the result down as shared state.

use std::sync::Arc;

use anyhow::Result;
use scanner_core::{AuthVerifier, ScannerConfig, StaticAuthVerifier};
use tokio::net::TcpListener;

use crate::controller::ScanController;
use crate::group_enumerator::GitlabGroupEnumerator;
use crate::job_monitor::JobMonitor;
use crate::job_registry::JobRegistry;
use crate::state::{AppState, ScannerContext};

/// HTTP-listener configuration, separate from [`ScannerConfig`] (which holds job/process/cache
/// tuning rather than transport concerns).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_addr: String,
}

impl ServerConfig {
    /// Resolve port/bind address from the environment, falling back to `0.0.0.0:8080`.
    #[must_use]
    pub fn from_env() -> Self {
        let port = std::env::var("SCAN_SERVICE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let bind_addr = std::env::var("SCAN_SERVICE_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
        Self { port, bind_addr }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Default [`AuthVerifier`]: a single username/password pair resolved from
/// `SCAN_SERVICE_USER`/`SCAN_SERVICE_PASSWORD`, falling back to `admin`/`admin` for local
/// development.
fn default_auth_verifier() -> Arc<dyn AuthVerifier> {
    let username = std::env::var("SCAN_SERVICE_USER").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("SCAN_SERVICE_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    Arc::new(StaticAuthVerifier::new(username, password))
}

/// Build every service exactly once and return the shared [`AppState`].
pub async fn bootstrap(config: ScannerConfig) -> Result<AppState> {
    tokio::fs::create_dir_all(&config.job_root).await?;
    tokio::fs::create_dir_all(&config.log_root).await?;

    let monitor = Arc::new(JobMonitor::new(config.job_root.clone(), config.stale_threshold));
    let registry = Arc::new(JobRegistry::new(config.max_concurrent_jobs));
    let group_enumerator = Arc::new(GitlabGroupEnumerator::new());

    let controller = Arc::new(ScanController::new(
        config.clone(),
        Arc::clone(&registry),
        Arc::clone(&monitor),
        group_enumerator,
    ));

    spawn_cleanup_task(Arc::clone(&controller), config.job_retention);

    Ok(Arc::new(ScannerContext {
        controller,
        auth_verifier: default_auth_verifier(),
    }))
}

/// Periodic `CleanupOldJobs` sweep, run on a background task for the lifetime of the service.
fn spawn_cleanup_task(controller: Arc<ScanController>, retention: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match controller.cleanup_old_jobs().await {
                Ok(removed) if removed > 0 => tracing::info!(removed, "cleaned up old scan jobs"),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "cleanup_old_jobs failed"),
            }
            controller.registry().prune_older_than(
                chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::hours(24)),
            );
        }
    });
}

/// Start the HTTP service on `config.port`, serving until the process exits.
pub async fn start_server(scanner_config: ScannerConfig, server_config: ServerConfig) -> Result<()> {
    let state = bootstrap(scanner_config).await?;
    let app = crate::routes::create_router(state);

    let addr = format!("{}:{}", server_config.bind_addr, server_config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr, "scanner HTTP service listening");
    axum::serve(listener, app).await?;
    Ok(())
}

//! Integration tests for the router's Basic-auth enforcement.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use scanner_core::{ScannerConfig, StaticAuthVerifier};
use tower::ServiceExt;

use scanner_http::routes::create_router;
use scanner_http::state::ScannerContext;
use scanner_http::{JobMonitor, JobRegistry, ScanController};

fn test_state(tmp: &std::path::Path) -> Arc<ScannerContext> {
    let mut config = ScannerConfig::from_env();
    config.job_root = tmp.join("jobs");
    config.log_root = tmp.join("logs");

    let monitor = Arc::new(JobMonitor::new(config.job_root.clone(), config.stale_threshold));
    let registry = Arc::new(JobRegistry::new(config.max_concurrent_jobs));
    let group_enumerator = Arc::new(scanner_http::group_enumerator::GitlabGroupEnumerator::new());
    let controller = Arc::new(ScanController::new(config, registry, monitor, group_enumerator));

    Arc::new(ScannerContext {
        controller,
        auth_verifier: Arc::new(StaticAuthVerifier::new("admin", "hunter2")),
    })
}

#[tokio::test]
async fn health_without_credentials_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_with_valid_credentials_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()));

    let credentials = base64::engine::general_purpose::STANDARD.encode("admin:hunter2");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Authorization", format!("Basic {credentials}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()));

    let credentials = base64::engine::general_purpose::STANDARD.encode("admin:wrong");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Authorization", format!("Basic {credentials}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_job_id_returns_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()));

    let credentials = base64::engine::general_purpose::STANDARD.encode("admin:hunter2");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/jobs/does-not-exist/results")
                .header("Authorization", format!("Basic {credentials}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

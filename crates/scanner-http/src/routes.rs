//! Route definitions and router construction. Every route is wrapped in the Basic-auth middleware;
//! none of the six endpoints are exempt.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::require_basic_auth;
use crate::handlers;
use crate::state::AppState;

/// Build the full API router over the given [`AppState`].
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/scan", post(handlers::submit_scan))
        .route("/scan/:job_id", get(handlers::get_aggregate))
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/:job_id/results", get(handlers::get_results))
        .route("/jobs/:job_id/partial", get(handlers::get_partial))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}

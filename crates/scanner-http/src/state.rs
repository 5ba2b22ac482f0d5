//! Shared application state type. Defines the `AppState` used across all handlers and routers: a
//! single `Arc<ScannerContext>` holding exactly what the scan service needs.

use std::sync::Arc;

use scanner_core::AuthVerifier;

use crate::controller::ScanController;

/// Everything a handler needs, built once at startup by `bootstrap()`.
pub struct ScannerContext {
    pub controller: Arc<ScanController>,
    pub auth_verifier: Arc<dyn AuthVerifier>,
}

/// Application state shared across all handlers.
pub type AppState = Arc<ScannerContext>;

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

//! HTTP API, Scan Controller, Job Registry and Job Monitor: the service-facing half of the scanner.
//! `scanner-worker` owns the per-repository subprocess; everything here coordinates those processes
//! and exposes their state over HTTP.

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;

pub mod auth;
pub mod bootstrap;
pub mod controller;
pub mod dto;
pub mod error;
pub mod group_enumerator;
pub mod handlers;
pub mod job_monitor;
pub mod job_registry;
pub mod routes;
pub mod state;

pub use bootstrap::{bootstrap, start_server, ServerConfig};
pub use controller::ScanController;
pub use error::HttpError;
pub use job_monitor::JobMonitor;
pub use job_registry::JobRegistry;
pub use routes::create_router;
pub use state::{AppState, ScannerContext};

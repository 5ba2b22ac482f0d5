#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

//! `scanner` binary: a `serve` subcommand that starts the HTTP service, a
//! `scan` convenience subcommand that submits a job to a running service and
//! polls it to completion, and a `cleanup` subcommand for offline
//! `CleanupOldJobs` sweeps.

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{bootstrap, CliContext};
pub use error::CliError;
pub use parser::{Cli, Commands};

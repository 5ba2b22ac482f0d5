#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

//! Domain types, port traits, configuration, and filesystem helpers shared by
//! every crate in the workspace. No subprocess or HTTP concerns live here.

pub mod atomic;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_layout;
pub mod paths;
pub mod ports;

pub use config::ScannerConfig;
pub use domain::{
    ApiCall, Dependency, FailedRepo, HttpMethod, InfrastructureComponent, Job, MasterPhase,
    MasterRecord, OverallStatus, Phase, ProgressEvent, ProgressSnapshot, RegistryState, RepoError,
    RepositoryStatus, ScanResult, StageBreakdown,
};
pub use error::{CoreError, CoreResult};
pub use paths::{DirectoryCreationStrategy, PathError, ensure_directory, verify_writable};
pub use ports::{
    AuthVerifier, CategoryVerdict, Categorizer, EnumeratedProject, GroupEnumerator,
    ScanProjectOutput, Scanner, StaticAuthVerifier,
};

// Silence unused dev-dependency warnings until every crate grows its own tests
// against these helpers.
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;

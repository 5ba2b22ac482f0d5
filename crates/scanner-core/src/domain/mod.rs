//! Pure domain types shared across the workspace. No I/O, no runtime dependencies.

pub mod job;
pub mod phase;
pub mod progress;
pub mod scan_result;

pub use job::{FailedRepo, Job, MasterPhase, MasterRecord, RepoError, RepositoryStatus};
pub use phase::{OverallStatus, Phase, RegistryState};
pub use progress::{ProgressEvent, ProgressSnapshot, StageBreakdown};
pub use scan_result::{ApiCall, Dependency, HttpMethod, InfrastructureComponent, ScanResult};

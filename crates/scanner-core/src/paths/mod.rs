//! Directory creation/verification utilities used when preparing the job and
//! log roots at service start.

mod ensure;
mod error;

pub use ensure::{DirectoryCreationStrategy, ensure_directory, verify_writable};
pub use error::PathError;

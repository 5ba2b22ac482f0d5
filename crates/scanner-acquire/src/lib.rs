#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

//! Repository acquisition: URL validation, URL → ZIP rewriting, streaming download + extraction,
//! and the LRU/TTL cache in front of them.

pub mod acquirer;
pub mod cache;
pub mod progress;
pub mod url;

pub use acquirer::{Acquirer, DownloadProgressFn, ExtractProgressFn};
pub use cache::{Cache, CacheStats};
pub use progress::ProgressThrottle;
pub use url::{UrlValidationError, rewrite_to_zip_url, validate_git_url};

#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;

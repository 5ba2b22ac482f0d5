//! `scan-worker`: one OS process per repository. The binary entry point lives in `main.rs`; this
//! library exposes the worker sequence and its default collaborators so they can be unit tested and
//! reused (e.g. by integration tests that spawn the binary).
#![deny(unsafe_code)]

pub mod categorizer;
pub mod default_scanner;
pub mod worker;

pub use categorizer::YamlCategorizer;
pub use default_scanner::FileSystemScanner;
pub use worker::{run, WorkerArgs};

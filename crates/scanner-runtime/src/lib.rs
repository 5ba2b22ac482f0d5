//! Process runtime for the scanner service: the Progress Aggregator, throttled atomic status
//! writes, subprocess spawn/stderr-capture, and supervised wait with timeout (part of §4.D). This
//! crate has no knowledge of HTTP or job orchestration; it is the layer `scanner-worker` and
//! `scanner-http` both build on for talking to OS processes and the filesystem status files.
#![deny(unsafe_code)]

pub mod progress_aggregator;
pub mod shutdown;
pub mod status_writer;
pub mod supervised_wait;
pub mod worker_process;

pub use progress_aggregator::ProgressAggregator;
pub use shutdown::shutdown_child;
pub use status_writer::StatusWriter;
pub use supervised_wait::{supervised_wait, ProcessOutcome};
pub use worker_process::{spawn_worker, WorkerHandle};

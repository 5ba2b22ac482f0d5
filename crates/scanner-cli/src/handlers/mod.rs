//! Subcommand handlers. Each is a thin async function taking the shared
//! `CliContext` plus its own arguments, printing user-facing status and
//! delegating heavy lifting to `scanner-core`/`scanner-http`.

pub mod cleanup;
pub mod scan;
pub mod serve;

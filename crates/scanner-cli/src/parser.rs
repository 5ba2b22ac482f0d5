//! Top-level CLI argument definitions.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "scanner", about = "Dependency & infrastructure scanner service", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP service.
    Serve {
        /// Port to listen on (defaults to `SCAN_SERVICE_PORT` env or 8080).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Submit a job to a running service and poll it to completion.
    Scan {
        /// Base URL of the running scanner service, e.g. `http://localhost:8080`.
        #[arg(long, default_value = "http://localhost:8080")]
        service_url: String,
        /// Basic auth username.
        #[arg(long, env = "SCAN_SERVICE_USER", default_value = "admin")]
        username: String,
        /// Basic auth password.
        #[arg(long, env = "SCAN_SERVICE_PASSWORD", default_value = "admin")]
        password: String,
        /// Git URL (repository or group/namespace) to scan.
        git_url: String,
    },
    /// Remove job directories older than the configured retention, without needing a running
    /// service.
    Cleanup,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}

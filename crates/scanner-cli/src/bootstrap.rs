//! CLI composition root: the small amount of shared state the `scan` subcommand's HTTP client
//! needs.

use reqwest::Client;

pub struct CliContext {
    pub http: Client,
}

#[must_use]
pub fn bootstrap() -> CliContext {
    CliContext { http: Client::new() }
}

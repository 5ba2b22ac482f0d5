//! `scanner serve`: start the HTTP service.

use crate::error::CliError;
use scanner_core::ScannerConfig;
use scanner_http::ServerConfig;

pub async fn execute(port: Option<u16>) -> Result<(), CliError> {
    let mut server_config = ServerConfig::from_env();
    if let Some(port) = port {
        server_config.port = port;
    }
    let scanner_config = ScannerConfig::from_env();

    println!(
        "starting scanner service on {}:{} (job root: {})",
        server_config.bind_addr,
        server_config.port,
        scanner_config.job_root.display()
    );

    scanner_http::start_server(scanner_config, server_config)
        .await
        .map_err(CliError::Other)
}

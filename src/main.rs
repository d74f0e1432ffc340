//! Safe File Store - Entry Point
//!
//! Web upload server backed by a single traversal-safe directory.

use log::{error, info};
use std::process;

use safe_file_store::utils::logging::setup_logging;
use safe_file_store::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default `info` filter
    setup_logging();

    info!("Launching Safe File Store server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            process::exit(1);
        }
    };

    let server = match Server::new(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("Server stopped with an error: {e}");
        process::exit(1);
    }
}

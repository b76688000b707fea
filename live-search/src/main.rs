//! Live Search Main Entry Point
//!
//! Reads JSON commands from stdin, keeps an OpenSearch index in sync with an
//! in-memory collection and answers searches on stdout.

use dotenv::dotenv;
use live_search::{Dependencies, LiveSearchError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
///
/// Logs go to stderr; stdout carries command replies.
fn init_tracing() -> Result<(), LiveSearchError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("live_search=info,live_search_repository=info"));

    let json_logs = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| LiveSearchError::config(format!("Failed to init tracing: {}", e)))?;

        info!(
            service_name = "live-search",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .pretty(),
            )
            .try_init()
            .map_err(|e| LiveSearchError::config(format!("Failed to init tracing: {}", e)))?;

        info!(
            service_name = "live-search",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), LiveSearchError> {
    dotenv().ok();

    init_tracing()?;

    info!("Starting live search");

    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.orchestrator.run().await {
        Ok(()) => {
            info!("Live search stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Live search failed");
            Err(e)
        }
    }
}

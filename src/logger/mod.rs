//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//!
//! Everything is emitted as `tracing` events; `init` installs the subscriber.

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Target used for access log lines so they can be filtered separately
pub const ACCESS_TARGET: &str = "blobserve::access";

/// Initialize the global subscriber with configuration
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over `logging.level` when set.
pub fn init(config: &Config) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| format!("Invalid log level '{}': {e}", config.logging.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("Logger already initialized: {e}"))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Object store server started successfully");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Storage backend: {}", config.storage.describe());
    tracing::info!("Default container: {}", config.serve.container);
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!("======================================");
}

pub fn log_server_stop(active_connections: usize) {
    tracing::info!("Shutdown requested, {active_connections} connection(s) still active");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_info(message: &str) {
    tracing::info!("{message}");
}

pub fn log_debug(message: &str) {
    tracing::debug!("{message}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

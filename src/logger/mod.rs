//! Logger module
//!
//! Installs the `tracing` subscriber and provides:
//! - Server lifecycle logging
//! - Access logging with multiple formats on the `access` target

mod format;

pub use format::{AccessLogEntry, LogFormat};

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`. Should be called once at
/// application startup.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    tracing_subscriber::fmt().with_env_filter(filter).try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Image host started successfully");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Storage root: {}", config.storage.root.display());
    tracing::info!("Id scheme: {:?}", config.storage.id_scheme);
    match &config.templates.dir {
        Some(dir) => tracing::info!("Templates: {}", dir.display()),
        None => tracing::info!("Templates: built-in"),
    }
    tracing::info!("Max upload size: {} bytes", config.http.max_upload_size);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!("======================================");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &LogFormat) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

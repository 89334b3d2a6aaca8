//! Logger module
//!
//! Thin helpers over `tracing` for the events the proxy server emits:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Upstream and connection errors

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `logging.level` when set.
/// Should be called once at application startup.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Secret proxy started");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!(
        "Routes: chat={} data={} save={}",
        config.routes.chat_path,
        config.routes.data_path,
        config.routes.save_path
    );
    log_upstream_status(config);
    tracing::info!("======================================");
}

/// Report which upstreams are usable without printing any secret
fn log_upstream_status(config: &Config) {
    let upstream = &config.upstream;
    match upstream.chat_base_url.as_deref() {
        Some(url) => tracing::info!("Chat backend: {url}"),
        None => tracing::warn!("Chat backend not configured (VPS_API_URL); chat requests will fail with 500"),
    }
    if upstream.chat_secret.is_none() {
        tracing::warn!("CHAT_SECRET not set; forwarding an empty secret");
    }
    if upstream.storage_resource_id.is_some() && upstream.storage_access_key.is_some() {
        tracing::info!("Storage backend: {}", upstream.storage_base_url);
    } else {
        tracing::warn!(
            "Storage not configured (JSONBIN_BIN_ID / JSONBIN_API_KEY); data requests will fail with 500"
        );
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// An outbound call that did not complete. Only the server log sees the detail.
pub fn log_upstream_failure(route: &str, err: &dyn std::error::Error) {
    tracing::error!(route, "Upstream call failed: {err}");
}

/// The inbound body could not be parsed as JSON, so no outbound call was made
pub fn log_malformed_body(route: &str, err: &dyn std::error::Error) {
    tracing::warn!(route, "Malformed request body: {err}");
}

/// The upstream answered with a non-success status
pub fn log_upstream_rejected(route: &str, status: u16) {
    tracing::warn!(route, status, "Upstream rejected request");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

pub fn log_shutdown() {
    tracing::info!("Shutdown signal received, no longer accepting connections");
}

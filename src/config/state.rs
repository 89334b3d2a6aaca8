// Application state module
// Configuration plus the three proxies, built once and shared by every connection

use std::sync::Arc;

use super::types::Config;
use crate::proxy::{ChatProxy, DataReadProxy, DataWriteProxy, Upstream};

/// Application state
///
/// Read-only after startup; requests share it without locking.
pub struct AppState {
    pub config: Config,
    pub chat: ChatProxy,
    pub data_read: DataReadProxy,
    pub data_write: DataWriteProxy,
}

impl AppState {
    /// Build the proxies from configuration over a shared transport
    pub fn new(config: Config, upstream: &Arc<dyn Upstream>) -> Self {
        Self {
            chat: ChatProxy::new(&config.upstream, Arc::clone(upstream)),
            data_read: DataReadProxy::new(&config.upstream, Arc::clone(upstream)),
            data_write: DataWriteProxy::new(&config.upstream, Arc::clone(upstream)),
            config,
        }
    }
}

// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    /// Seconds a client may take to send request headers; 0 disables
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Routes configuration
///
/// Each proxy is mounted on one exact path.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RoutesConfig {
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    #[serde(default = "default_data_path")]
    pub data_path: String,
    #[serde(default = "default_save_path")]
    pub save_path: String,
    /// Health check configuration
    #[serde(default)]
    pub health: HealthConfig,
}

#[allow(clippy::missing_const_for_fn)]
fn default_chat_path() -> String {
    "/api/chat".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_data_path() -> String {
    "/api/data".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_save_path() -> String {
    "/api/save".to_string()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            chat_path: default_chat_path(),
            data_path: default_data_path(),
            save_path: default_save_path(),
            health: HealthConfig::default(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthConfig {
    /// Enable health check endpoint
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
        }
    }
}

/// Upstream services the proxies talk to.
///
/// Secrets live here and only here. `None` means "not configured", which the
/// handlers turn into a 500 per request instead of failing at startup.
#[derive(Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Chat backend base URL (`VPS_API_URL`)
    #[serde(default)]
    pub chat_base_url: Option<String>,
    /// Shared secret injected into chat payloads (`CHAT_SECRET`), empty when unset
    #[serde(default)]
    pub chat_secret: Option<String>,
    /// Storage service base, the resource id is appended to it
    #[serde(default = "default_storage_base_url")]
    pub storage_base_url: String,
    /// Storage resource identifier (`JSONBIN_BIN_ID`)
    #[serde(default)]
    pub storage_resource_id: Option<String>,
    /// Storage access key (`JSONBIN_API_KEY`)
    #[serde(default)]
    pub storage_access_key: Option<String>,
    /// Outbound request timeout; transport default when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

pub fn default_storage_base_url() -> String {
    "https://api.jsonbin.io/v3/b".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            chat_base_url: None,
            chat_secret: None,
            storage_base_url: default_storage_base_url(),
            storage_resource_id: None,
            storage_access_key: None,
            request_timeout_secs: None,
        }
    }
}

// Hand-written so secrets never end up in debug output
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("chat_base_url", &self.chat_base_url)
            .field("chat_secret", &self.chat_secret.as_ref().map(|_| "<redacted>"))
            .field("storage_base_url", &self.storage_base_url)
            .field("storage_resource_id", &self.storage_resource_id)
            .field(
                "storage_access_key",
                &self.storage_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

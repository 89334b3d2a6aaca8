// Configuration module entry point
// Loads configuration once at startup and holds the shared runtime state

mod env;
mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use env::DeploymentEnv;
pub use state::AppState;
pub use types::{Config, RoutesConfig, UpstreamConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with(config_path, &DeploymentEnv::from_process())
    }

    /// Load configuration with explicitly supplied deployment variables.
    ///
    /// The deployment variables win over the file and `SERVER_*` layers.
    pub fn load_with(config_path: &str, env: &DeploymentEnv) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVER"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("http.server_name", "secret-proxy/0.1")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("upstream.storage_base_url", types::default_storage_base_url())?
            .set_override_option("upstream.chat_base_url", env.chat_base_url.clone())?
            .set_override_option("upstream.chat_secret", env.chat_secret.clone())?
            .set_override_option("upstream.storage_resource_id", env.storage_resource_id.clone())?
            .set_override_option("upstream.storage_access_key", env.storage_access_key.clone())?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;
        cfg.upstream.drop_empty_values();
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

impl UpstreamConfig {
    /// Treat blank values from any layer as unset
    fn drop_empty_values(&mut self) {
        for value in [
            &mut self.chat_base_url,
            &mut self.chat_secret,
            &mut self.storage_resource_id,
            &mut self.storage_access_key,
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_FILE: &str = "definitely-not-a-config-file";

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_with(MISSING_FILE, &DeploymentEnv::default()).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.routes.chat_path, "/api/chat");
        assert_eq!(cfg.routes.data_path, "/api/data");
        assert_eq!(cfg.routes.save_path, "/api/save");
        assert_eq!(cfg.upstream.storage_base_url, "https://api.jsonbin.io/v3/b");
        assert!(cfg.upstream.chat_base_url.is_none());
        assert!(cfg.upstream.storage_access_key.is_none());
        assert!(cfg.upstream.request_timeout_secs.is_none());
    }

    #[test]
    fn test_deployment_env_overrides() {
        let env = DeploymentEnv {
            chat_base_url: Some("http://10.0.0.1:8080".to_string()),
            chat_secret: Some("s3cret".to_string()),
            storage_resource_id: Some("bin-1".to_string()),
            storage_access_key: Some("key-1".to_string()),
        };
        let cfg = Config::load_with(MISSING_FILE, &env).unwrap();
        assert_eq!(cfg.upstream.chat_base_url.as_deref(), Some("http://10.0.0.1:8080"));
        assert_eq!(cfg.upstream.chat_secret.as_deref(), Some("s3cret"));
        assert_eq!(cfg.upstream.storage_resource_id.as_deref(), Some("bin-1"));
        assert_eq!(cfg.upstream.storage_access_key.as_deref(), Some("key-1"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let mut upstream = UpstreamConfig {
            chat_base_url: Some("  ".to_string()),
            chat_secret: Some(String::new()),
            storage_resource_id: Some("bin".to_string()),
            ..UpstreamConfig::default()
        };
        upstream.drop_empty_values();
        assert!(upstream.chat_base_url.is_none());
        assert!(upstream.chat_secret.is_none());
        assert_eq!(upstream.storage_resource_id.as_deref(), Some("bin"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let upstream = UpstreamConfig {
            chat_secret: Some("s3cret".to_string()),
            storage_access_key: Some("master-key".to_string()),
            ..UpstreamConfig::default()
        };
        let printed = format!("{upstream:?}");
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("master-key"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::load_with(MISSING_FILE, &DeploymentEnv::default()).unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), cfg.server.port);
    }
}

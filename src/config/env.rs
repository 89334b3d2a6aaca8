// Deployment variables
// The four process environment variables a deployment sets

/// Values read from `VPS_API_URL`, `CHAT_SECRET`, `JSONBIN_BIN_ID` and `JSONBIN_API_KEY`.
///
/// Read once in `main`; request handling never touches the process environment.
#[derive(Debug, Clone, Default)]
pub struct DeploymentEnv {
    pub chat_base_url: Option<String>,
    pub chat_secret: Option<String>,
    pub storage_resource_id: Option<String>,
    pub storage_access_key: Option<String>,
}

impl DeploymentEnv {
    pub fn from_process() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            chat_base_url: get("VPS_API_URL"),
            chat_secret: get("CHAT_SECRET"),
            storage_resource_id: get("JSONBIN_BIN_ID"),
            storage_access_key: get("JSONBIN_API_KEY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("VPS_API_URL", "http://vps:8080"),
            ("CHAT_SECRET", ""),
            ("JSONBIN_BIN_ID", "abc"),
        ]
        .into_iter()
        .collect();

        let env = DeploymentEnv::from_lookup(|k| vars.get(k).map(ToString::to_string));
        assert_eq!(env.chat_base_url.as_deref(), Some("http://vps:8080"));
        assert!(env.chat_secret.is_none());
        assert_eq!(env.storage_resource_id.as_deref(), Some("abc"));
        assert!(env.storage_access_key.is_none());
    }
}

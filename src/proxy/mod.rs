//! Secret-shielding proxies
//!
//! Each proxy maps one inbound request to exactly one outbound request and
//! relays the result. The types here are plain data: the hyper adapter lives
//! in `handler::router`, the outbound transport behind [`Upstream`].

mod chat;
mod error;
mod storage;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

use hyper::body::Bytes;
use hyper::{Method, StatusCode};

use crate::http::CachePolicy;

pub use chat::ChatProxy;
pub use error::ProxyError;
pub use storage::{DataReadProxy, DataWriteProxy};
pub use upstream::{HttpUpstream, Upstream};

/// Inbound request, detached from the connection it arrived on
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub body: Bytes,
}

impl ProxyRequest {
    pub fn new(method: Method, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            body: body.into(),
        }
    }
}

/// Response produced by a proxy; the body is always JSON
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub body: Bytes,
    pub cache_control: Option<CachePolicy>,
    /// Set on 405 responses
    pub allow: Option<Method>,
}

impl ProxyResponse {
    /// Relay an already-encoded JSON body
    pub const fn json(status: StatusCode, body: Bytes) -> Self {
        Self {
            status,
            body,
            cache_control: None,
            allow: None,
        }
    }

    /// `{"error": message}`
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::json(status, Bytes::from(body))
    }

    #[must_use]
    pub fn with_cache_control(mut self, policy: CachePolicy) -> Self {
        self.cache_control = Some(policy);
        self
    }
}

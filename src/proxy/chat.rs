//! Chat proxy
//!
//! Forwards `{message, history}` to `<chat backend>/chat`, adding the shared
//! secret server-side. Upstream errors are relayed verbatim (status and body).

use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::FpCategory;
use std::sync::Arc;

use super::upstream::{OutboundRequest, Upstream};
use super::{ProxyError, ProxyRequest, ProxyResponse};
use crate::config::UpstreamConfig;
use crate::logger;

const ROUTE: &str = "chat";

const METHOD_NOT_ALLOWED: &str = "POST만 허용";
const MISCONFIGURED: &str = "서버 설정 오류";
const UNREACHABLE: &str = "포저에게 연결할 수 없습니다. 잠시 후 다시 시도해주세요.";

/// Inbound chat body.
///
/// Both fields are forwarded exactly as sent unless they are not supplied.
/// A field counts as not supplied when it is absent or holds `null`,
/// `false`, `0` or `""`; then `message` becomes `""` and `history` becomes
/// `[]`. History turns are opaque and never inspected.
#[derive(Debug, PartialEq)]
pub struct ChatRequest {
    pub message: Value,
    pub history: Value,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            message: Value::String(String::new()),
            history: Value::Array(Vec::new()),
        }
    }
}

#[derive(Deserialize)]
struct RawChatRequest {
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    history: Option<Value>,
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.classify() == FpCategory::Zero),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

impl ChatRequest {
    /// Parse an inbound body. Empty or non-object JSON yields the defaults;
    /// only bytes that are not JSON at all are an error.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Ok(Self::default());
        }

        let raw: RawChatRequest = serde_json::from_value(value)?;
        let defaults = Self::default();
        Ok(Self {
            message: raw.message.filter(|v| !is_unset(v)).unwrap_or(defaults.message),
            history: raw.history.filter(|v| !is_unset(v)).unwrap_or(defaults.history),
        })
    }
}

/// What the chat backend receives
#[derive(Serialize)]
struct ChatPayload<'a> {
    message: &'a Value,
    history: &'a Value,
    secret: &'a str,
}

pub struct ChatProxy {
    backend_url: Option<String>,
    secret: String,
    upstream: Arc<dyn Upstream>,
}

impl ChatProxy {
    pub fn new(config: &UpstreamConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            backend_url: config
                .chat_base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            secret: config.chat_secret.clone().unwrap_or_default(),
            upstream,
        }
    }

    pub async fn handle(&self, request: ProxyRequest) -> ProxyResponse {
        self.proxy(request)
            .await
            .unwrap_or_else(ProxyError::into_response)
    }

    async fn proxy(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        if request.method != Method::POST {
            return Err(ProxyError::MethodNotAllowed {
                allow: Method::POST,
                message: METHOD_NOT_ALLOWED,
            });
        }

        let Some(backend_url) = self.backend_url.as_deref() else {
            logger::log_error("Chat backend URL is not configured");
            return Err(ProxyError::ServerMisconfigured(MISCONFIGURED));
        };

        let chat = ChatRequest::from_body(&request.body).map_err(|e| {
            logger::log_malformed_body(ROUTE, &e);
            ProxyError::BackendUnreachable(UNREACHABLE)
        })?;

        let payload = serde_json::to_vec(&ChatPayload {
            message: &chat.message,
            history: &chat.history,
            secret: &self.secret,
        })
        .map_err(|e| Self::backend_unreachable(&e))?;

        let outbound = OutboundRequest::new(Method::POST, format!("{backend_url}/chat"))
            .json_body(Bytes::from(payload));

        let response = self
            .upstream
            .send(outbound)
            .await
            .map_err(|e| Self::backend_unreachable(&e))?;

        // The body must be JSON whatever the status
        response.ensure_json().map_err(|e| Self::backend_unreachable(&e))?;

        if !response.status.is_success() {
            logger::log_upstream_rejected(ROUTE, response.status.as_u16());
            return Err(ProxyError::UpstreamRelayed {
                status: response.status,
                body: response.body,
            });
        }

        Ok(ProxyResponse::json(StatusCode::OK, response.body))
    }

    fn backend_unreachable(err: &dyn std::error::Error) -> ProxyError {
        logger::log_upstream_failure(ROUTE, err);
        ProxyError::BackendUnreachable(UNREACHABLE)
    }
}

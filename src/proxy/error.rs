// Proxy error taxonomy
// Every variant maps to exactly one response; technical detail stays in the log

use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use thiserror::Error;

use super::ProxyResponse;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Wrong HTTP method for this proxy
    #[error("method not allowed (expected {allow})")]
    MethodNotAllowed {
        allow: Method,
        message: &'static str,
    },

    /// Required configuration is absent; detected before any outbound call
    #[error("server misconfigured")]
    ServerMisconfigured(&'static str),

    /// Upstream rejected the request; status and body are mirrored as-is
    #[error("upstream answered {status}, relaying body")]
    UpstreamRelayed { status: StatusCode, body: Bytes },

    /// Upstream rejected the request; status is mirrored, body replaced
    #[error("upstream answered {status}")]
    UpstreamRejected {
        status: StatusCode,
        message: &'static str,
    },

    /// Chat call could not be completed: unreadable inbound body, backend
    /// unreachable, or a reply that is not JSON
    #[error("chat backend unreachable")]
    BackendUnreachable(&'static str),

    /// Storage call could not be completed; same causes as above
    #[error("storage unavailable")]
    StorageUnavailable(&'static str),
}

impl ProxyError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::ServerMisconfigured(_) | Self::StorageUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::UpstreamRelayed { status, .. } | Self::UpstreamRejected { status, .. } => *status,
            Self::BackendUnreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn into_response(self) -> ProxyResponse {
        let status = self.status();
        match self {
            Self::MethodNotAllowed { allow, message } => {
                let mut response = ProxyResponse::error(status, message);
                response.allow = Some(allow);
                response
            }
            Self::UpstreamRelayed { body, .. } => ProxyResponse::json(status, body),
            Self::ServerMisconfigured(message)
            | Self::UpstreamRejected { message, .. }
            | Self::BackendUnreachable(message)
            | Self::StorageUnavailable(message) => ProxyResponse::error(status, message),
        }
    }
}

//! HTTP response building module
//!
//! Turns proxy results and router-level outcomes into hyper responses.
//! All bodies are JSON.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use super::CachePolicy;
use crate::proxy::ProxyResponse;

const JSON: &str = "application/json; charset=utf-8";

/// Convert a proxy result into the wire response
pub fn build_proxy_response(proxied: ProxyResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(proxied.status)
        .header(CONTENT_TYPE, JSON)
        .header(CONTENT_LENGTH, proxied.body.len());

    if let Some(policy) = proxied.cache_control {
        builder = builder.header(CACHE_CONTROL, policy.to_header_value());
    }
    if let Some(allow) = &proxied.allow {
        builder = builder.header(ALLOW, allow.as_str());
    }

    let status = proxied.status;
    builder.body(Full::new(proxied.body)).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        bare_response(status)
    })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::BAD_REQUEST, "Bad Request")
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Build health check response
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "status": status }).to_string();
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, JSON)
        .header(CACHE_CONTROL, CachePolicy::NoCache.to_header_value())
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            bare_response(StatusCode::OK)
        })
}

fn build_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    build_proxy_response(ProxyResponse::error(status, message))
}

fn bare_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Stamp the `Server` header on an outgoing response
pub fn set_server_header(response: &mut Response<Full<Bytes>>, server_name: &str) {
    match HeaderValue::from_str(server_name) {
        Ok(value) => {
            response.headers_mut().insert(hyper::header::SERVER, value);
        }
        Err(e) => log_build_error("Server header", &e),
    }
}

/// Log response build error
fn log_build_error(what: &str, error: &dyn std::fmt::Display) {
    crate::logger::log_error(&format!("Failed to build {what} response: {error}"));
}

//! Storage proxies
//!
//! Read and replace one JSON document held by the external storage service.
//! The access key travels in a dedicated header and never reaches the browser.
//! Unlike the chat proxy, upstream error bodies are replaced by a generic message.

use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use std::sync::Arc;

use super::upstream::{OutboundRequest, Upstream, UpstreamResponse};
use super::{ProxyError, ProxyRequest, ProxyResponse};
use crate::config::UpstreamConfig;
use crate::http::CachePolicy;
use crate::logger;

/// Header carrying the storage access key
pub const ACCESS_KEY_HEADER: &str = "X-Master-Key";

const MISCONFIGURED: &str = "서버 환경 변수가 설정되지 않았습니다.";

const READ_ROUTE: &str = "data";
const READ_REJECTED: &str = "jsonbin 요청 실패";
const READ_FAILED: &str = "데이터를 가져올 수 없습니다.";

const WRITE_ROUTE: &str = "save";
const WRITE_METHOD_NOT_ALLOWED: &str = "Method not allowed";
const WRITE_REJECTED: &str = "jsonbin 저장 실패";
const WRITE_FAILED: &str = "데이터를 저장할 수 없습니다.";

/// Where the document lives and how to reach it
#[derive(Clone)]
pub struct StorageTarget {
    base_url: String,
    resource_id: Option<String>,
    access_key: Option<String>,
}

/// A target with both required values present
struct Resolved<'a> {
    resource_url: String,
    access_key: &'a str,
}

impl StorageTarget {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            base_url: config.storage_base_url.trim_end_matches('/').to_string(),
            resource_id: config.storage_resource_id.clone(),
            access_key: config.storage_access_key.clone(),
        }
    }

    fn resolve(&self) -> Result<Resolved<'_>, ProxyError> {
        match (self.resource_id.as_deref(), self.access_key.as_deref()) {
            (Some(id), Some(key)) => Ok(Resolved {
                resource_url: format!("{}/{id}", self.base_url),
                access_key: key,
            }),
            _ => {
                logger::log_error("Storage resource id or access key is not configured");
                Err(ProxyError::ServerMisconfigured(MISCONFIGURED))
            }
        }
    }
}

impl Resolved<'_> {
    fn request(&self, method: Method, url: String) -> OutboundRequest {
        OutboundRequest::new(method, url).header(ACCESS_KEY_HEADER, self.access_key)
    }

    fn latest_url(&self) -> String {
        format!("{}/latest", self.resource_url)
    }
}

/// Shared tail of both proxies: status check first, then the body must be JSON
fn relay(
    route: &str,
    response: UpstreamResponse,
    rejected: &'static str,
    failed: &'static str,
) -> Result<ProxyResponse, ProxyError> {
    if !response.status.is_success() {
        logger::log_upstream_rejected(route, response.status.as_u16());
        return Err(ProxyError::UpstreamRejected {
            status: response.status,
            message: rejected,
        });
    }
    if let Err(e) = response.ensure_json() {
        logger::log_upstream_failure(route, &e);
        return Err(ProxyError::StorageUnavailable(failed));
    }
    Ok(ProxyResponse::json(StatusCode::OK, response.body))
}

/// Serves the latest stored document. Accepts any method.
pub struct DataReadProxy {
    target: StorageTarget,
    upstream: Arc<dyn Upstream>,
}

impl DataReadProxy {
    pub fn new(config: &UpstreamConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            target: StorageTarget::from_config(config),
            upstream,
        }
    }

    pub async fn handle(&self, request: ProxyRequest) -> ProxyResponse {
        self.proxy(request)
            .await
            .unwrap_or_else(ProxyError::into_response)
    }

    async fn proxy(&self, _request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        let target = self.target.resolve()?;
        let outbound = target.request(Method::GET, target.latest_url());

        let response = self.upstream.send(outbound).await.map_err(|e| {
            logger::log_upstream_failure(READ_ROUTE, &e);
            ProxyError::StorageUnavailable(READ_FAILED)
        })?;

        // Every read must reach the upstream
        relay(READ_ROUTE, response, READ_REJECTED, READ_FAILED)
            .map(|ok| ok.with_cache_control(CachePolicy::NoStore))
    }
}

/// Replaces the stored document with the request body. PUT only.
pub struct DataWriteProxy {
    target: StorageTarget,
    upstream: Arc<dyn Upstream>,
}

impl DataWriteProxy {
    pub fn new(config: &UpstreamConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            target: StorageTarget::from_config(config),
            upstream,
        }
    }

    pub async fn handle(&self, request: ProxyRequest) -> ProxyResponse {
        self.proxy(request)
            .await
            .unwrap_or_else(ProxyError::into_response)
    }

    async fn proxy(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        if request.method != Method::PUT {
            return Err(ProxyError::MethodNotAllowed {
                allow: Method::PUT,
                message: WRITE_METHOD_NOT_ALLOWED,
            });
        }

        let target = self.target.resolve()?;
        let mut outbound = target.request(Method::PUT, target.resource_url.clone());

        // An empty body is forwarded as no body at all
        if !request.body.iter().all(u8::is_ascii_whitespace) {
            validate_json(&request.body)?;
            outbound = outbound.json_body(request.body);
        }

        let response = self.upstream.send(outbound).await.map_err(|e| {
            logger::log_upstream_failure(WRITE_ROUTE, &e);
            ProxyError::StorageUnavailable(WRITE_FAILED)
        })?;

        relay(WRITE_ROUTE, response, WRITE_REJECTED, WRITE_FAILED)
    }
}

fn validate_json(body: &Bytes) -> Result<(), ProxyError> {
    serde_json::from_slice::<serde::de::IgnoredAny>(body)
        .map(|_| ())
        .map_err(|e| {
            logger::log_malformed_body(WRITE_ROUTE, &e);
            ProxyError::StorageUnavailable(WRITE_FAILED)
        })
}

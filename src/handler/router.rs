//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body size checks, route matching,
//! and the adapter between hyper requests and the transport-neutral proxies.

use crate::config::{AppState, RoutesConfig};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::proxy::{ProxyError, ProxyRequest};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Where a request path leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Proxy(ProxyRoute),
    Health,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProxyRoute {
    Chat,
    Data,
    Save,
}

impl Route {
    /// Exact path match against the configured mount points
    fn resolve(path: &str, routes: &RoutesConfig) -> Self {
        if routes.health.enabled && path == routes.health.liveness_path {
            Self::Health
        } else if path == routes.chat_path {
            Self::Proxy(ProxyRoute::Chat)
        } else if path == routes.data_path {
            Self::Proxy(ProxyRoute::Data)
        } else if path == routes.save_path {
            Self::Proxy(ProxyRoute::Save)
        } else {
            Self::NotFound
        }
    }

    const fn name(self) -> Option<&'static str> {
        match self {
            Self::Proxy(ProxyRoute::Chat) => Some("chat"),
            Self::Proxy(ProxyRoute::Data) => Some("data"),
            Self::Proxy(ProxyRoute::Save) => Some("save"),
            Self::Health => Some("health"),
            Self::NotFound => None,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let route = Route::resolve(req.uri().path(), &state.config.routes);

    let mut entry = state.config.logging.access_log.then(|| {
        let mut entry = AccessLogEntry::start(
            peer_addr.to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.route = route.name();
        entry.user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry
    });

    let mut response = dispatch(req, route, &state).await;
    http::set_server_header(&mut response, &state.config.http.server_name);

    if let Some(entry) = entry.as_mut() {
        let body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.finish(response.status().as_u16(), body_bytes);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(req: Request<B>, route: Route, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let target = match route {
        Route::Health if req.method() == Method::GET => return http::build_health_response("ok"),
        Route::Health => {
            return http::build_proxy_response(
                ProxyError::MethodNotAllowed {
                    allow: Method::GET,
                    message: "Method Not Allowed",
                }
                .into_response(),
            )
        }
        Route::NotFound => return http::build_404_response(),
        Route::Proxy(target) => target,
    };

    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return resp;
    }

    let request = match read_body(req, max_body_size).await {
        Ok(request) => request,
        Err(resp) => return resp,
    };

    let proxied = match target {
        ProxyRoute::Chat => state.chat.handle(request).await,
        ProxyRoute::Data => state.data_read.handle(request).await,
        ProxyRoute::Save => state.data_write.handle(request).await,
    };
    http::build_proxy_response(proxied)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Collect the body, never buffering more than `max_body_size` bytes
async fn read_body<B>(
    req: Request<B>,
    max_body_size: u64,
) -> Result<ProxyRequest, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);

    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(ProxyRequest::new(parts.method, collected.to_bytes())),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_400_response())
        }
    }
}

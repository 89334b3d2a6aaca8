// Test double for the outbound transport

use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::StatusCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::upstream::{OutboundRequest, TransportError, Upstream, UpstreamResponse};

enum Reply {
    Respond(StatusCode, &'static str),
    Fail,
}

/// Records every outbound request and answers with a canned reply
pub struct RecordingUpstream {
    reply: Reply,
    delay: Option<Duration>,
    calls: Mutex<Vec<OutboundRequest>>,
}

impl RecordingUpstream {
    pub fn responding(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Respond(StatusCode::from_u16(status).unwrap(), body),
            delay: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Like `responding`, but each reply arrives only after `delay`
    pub fn responding_after(delay: Duration, status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Respond(StatusCode::from_u16(status).unwrap(), body),
            delay: Some(delay),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails at the transport level
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Fail,
            delay: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// The single request made so far, parsed body included
    pub fn only_call(&self) -> (OutboundRequest, Option<serde_json::Value>) {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one outbound call");
        let call = calls.into_iter().next().unwrap();
        let body = call
            .body
            .as_ref()
            .map(|b| serde_json::from_slice(b).unwrap());
        (call, body)
    }
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        self.calls.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.reply {
            Reply::Respond(status, body) => Ok(UpstreamResponse {
                status,
                body: Bytes::from_static(body.as_bytes()),
            }),
            // Any transport error will do; the proxies never look inside
            Reply::Fail => Err(TransportError::Json(
                serde_json::from_str::<serde_json::Value>("connection reset").unwrap_err(),
            )),
        }
    }
}

pub fn body_json(body: &Bytes) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

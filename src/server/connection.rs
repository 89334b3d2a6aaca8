// Connection handling module
// Accepts a single TCP connection and serves it with the request router

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    );
}

/// Serve one connection in its own task.
///
/// HTTP/1.1 with keep-alive when `keep_alive_timeout > 0`. `read_timeout`
/// bounds how long a client may take to send request headers, idle
/// keep-alive included. A request already being proxied is never cut off
/// here; outbound timing belongs to the upstream client. The connection
/// counter is released when the task ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);
        if performance.read_timeout > 0 {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(Duration::from_secs(performance.read_timeout));
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DeploymentEnv};
    use crate::proxy::testing::RecordingUpstream;
    use crate::proxy::Upstream;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn state_with(upstream: Arc<RecordingUpstream>, max_connections: Option<u64>) -> Arc<AppState> {
        let env = DeploymentEnv {
            chat_base_url: Some("http://vps:8080".to_string()),
            chat_secret: Some("s3cret".to_string()),
            storage_resource_id: None,
            storage_access_key: None,
        };
        let mut config = Config::load_with("no-such-config-file", &env).unwrap();
        config.performance.read_timeout = 1;
        config.performance.max_connections = max_connections;
        let upstream: Arc<dyn Upstream> = upstream;
        Arc::new(AppState::new(config, &upstream))
    }

    /// Accept one connection through `accept_connection`, send `raw` and
    /// return everything the server wrote before closing.
    async fn exchange(state: &Arc<AppState>, counter: &Arc<AtomicUsize>, raw: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        accept_connection(stream, peer, state, counter);

        client.write_all(raw.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    async fn wait_for_release(counter: &AtomicUsize) {
        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("connection counter was never released");
    }

    #[tokio::test]
    async fn test_slow_upstream_outlives_read_timeout() {
        let upstream = RecordingUpstream::responding_after(
            Duration::from_secs(2),
            200,
            r#"{"reply":"late"}"#,
        );
        let state = state_with(upstream.clone(), None);
        let counter = Arc::new(AtomicUsize::new(0));

        let body = r#"{"message":"hi"}"#;
        let raw = format!(
            "POST /api/chat HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let response = exchange(&state, &counter, &raw).await;

        assert!(response.starts_with("HTTP/1.1 200"), "got: {response:?}");
        assert!(response.ends_with(r#"{"reply":"late"}"#));
        assert_eq!(upstream.calls().len(), 1);
        wait_for_release(&counter).await;
    }

    #[tokio::test]
    async fn test_connection_over_limit_is_dropped() {
        let upstream = RecordingUpstream::responding(200, "{}");
        let state = state_with(upstream.clone(), Some(0));
        let counter = Arc::new(AtomicUsize::new(0));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        accept_connection(stream, peer, &state, &counter);

        // Rolled back synchronously, before anything is spawned
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert!(response.is_empty());
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn test_counter_released_after_connection_closes() {
        let upstream = RecordingUpstream::responding(200, "{}");
        let state = state_with(upstream, Some(1));
        let counter = Arc::new(AtomicUsize::new(0));

        let response = exchange(
            &state,
            &counter,
            "GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;

        assert!(response.starts_with("HTTP/1.1 200"));
        wait_for_release(&counter).await;
    }
}

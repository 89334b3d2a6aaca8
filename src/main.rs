use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

mod config;
mod handler;
mod http;
mod logger;
mod proxy;
mod server;

use proxy::{HttpUpstream, Upstream};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path (without extension); defaults to ./config.toml
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;

    logger::init(&cfg).map_err(|e| e as Box<dyn std::error::Error>)?;

    // Build the Tokio runtime, sized by `server.workers` when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(
        cfg.upstream.request_timeout_secs.map(Duration::from_secs),
    )?);

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(config::AppState::new(cfg, &upstream));

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    server::start_server_loop(listener, state, shutdown).await
}

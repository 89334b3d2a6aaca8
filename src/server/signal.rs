// Signal handling module
//
// SIGTERM and SIGINT (Ctrl+C) stop the accept loop. Elsewhere only Ctrl+C is available.

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Spawn a task that notifies `shutdown` on the first termination signal.
///
/// Uses `notify_one`, so a signal arriving before the loop waits is not lost.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    logger::log_warning(&format!(
                        "Failed to register signal handlers ({e}), falling back to Ctrl+C"
                    ));
                    wait_for_ctrl_c(&shutdown).await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("SIGTERM received"),
            _ = sigint.recv() => tracing::info!("SIGINT received"),
        }
        shutdown.notify_one();
    });
}

#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        wait_for_ctrl_c(&shutdown).await;
    });
}

async fn wait_for_ctrl_c(shutdown: &Notify) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => shutdown.notify_one(),
        Err(e) => logger::log_error(&format!("Failed to listen for Ctrl+C: {e}")),
    }
}

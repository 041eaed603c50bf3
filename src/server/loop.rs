// Server loop module
// Accepts connections until shutdown is requested, then drains active ones

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

/// How long active connections may finish after shutdown is requested
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Main accept loop
///
/// Returns once the signal handler requests shutdown and active connections
/// have drained or [`DRAIN_TIMEOUT`] elapsed.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    signals: Arc<SignalHandler>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = signals.shutdown.notified() => {
                logger::log_server_stop(active_connections.load(Ordering::SeqCst));
                break;
            }
        }
    }

    // Stop accepting before waiting on in-flight requests
    drop(listener);
    drain_connections(&active_connections, DRAIN_TIMEOUT).await;
    Ok(())
}

/// Wait until no connection is active or the deadline passes
async fn drain_connections(active_connections: &AtomicUsize, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while active_connections.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Drain timeout reached with {} connection(s) still active",
                active_connections.load(Ordering::SeqCst)
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
    logger::log_info("All connections closed");
}

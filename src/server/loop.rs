// Server loop module
// Accepts connections until a shutdown signal arrives

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;

/// Accept connections until `shutdown` resolves.
///
/// Connections already accepted keep running on their own tasks after the
/// loop returns.
pub async fn run(listener: TcpListener, state: Arc<AppState>, shutdown: impl Future<Output = ()>) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => tracing::error!("Failed to accept connection: {e}"),
                }
            }

            () = &mut shutdown => {
                tracing::info!(
                    "Stopped accepting connections ({} still active)",
                    active_connections.load(Ordering::SeqCst)
                );
                break;
            }
        }
    }
}

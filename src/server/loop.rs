// Server loop module
// Accepts connections until the shutdown signal fires

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::{accept_connection, ConnectionSettings};
use super::signal::Shutdown;
use crate::handler::RequestHandler;
use crate::logger;

/// Accept and dispatch connections until `shutdown` is triggered.
///
/// The listener is owned by the loop and dropped before returning, on
/// every exit path. Accept errors are logged and the loop keeps going.
/// Connections already being served finish in their own tasks.
pub async fn start_server_loop<H: RequestHandler>(
    listener: TcpListener,
    handler: Arc<H>,
    settings: ConnectionSettings,
    shutdown: Arc<Shutdown>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let local_addr = listener.local_addr().ok();

    loop {
        tokio::select! {
            // Stop wins over a pending accept
            biased;

            () = shutdown.wait() => break,

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &handler,
                            &active_connections,
                            settings,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }
        }
    }

    drop(listener);
    if let Some(addr) = local_addr {
        logger::log_listener_closed(&addr);
    }
}

// Connection handling module
// Accepts a single TCP connection and serves HTTP/1 on it

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;

use super::io::IsolatedIo;
use crate::config::PerformanceConfig;
use crate::handler::RequestHandler;
use crate::logger;

/// Per-connection settings derived from the performance configuration
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub keep_alive: bool,
    /// Hard cap on how long a connection is served, idle or not
    pub max_lifetime: Duration,
    pub max_connections: Option<u64>,
}

impl From<&PerformanceConfig> for ConnectionSettings {
    fn from(config: &PerformanceConfig) -> Self {
        Self {
            keep_alive: config.keep_alive,
            max_lifetime: Duration::from_secs(config.max_connection_lifetime),
            max_connections: config.max_connections,
        }
    }
}

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `handler` - Request handler shared by all connections
/// * `conn_counter` - Active connection counter
/// * `settings` - Keep-alive, lifetime cap and connection limit
pub fn accept_connection<H: RequestHandler>(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    handler: &Arc<H>,
    conn_counter: &Arc<AtomicUsize>,
    settings: ConnectionSettings,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = settings.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(
        stream,
        Arc::clone(handler),
        Arc::clone(conn_counter),
        settings,
    );
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo` and [`IsolatedIo`]
/// 2. Serves HTTP/1 with the request handler
/// 3. Closes it once the maximum lifetime has elapsed
/// 4. Decrements connection counter when done
///
/// A client that disconnects mid-response only ends its own task.
fn handle_connection<H: RequestHandler>(
    stream: tokio::net::TcpStream,
    handler: Arc<H>,
    conn_counter: Arc<AtomicUsize>,
    settings: ConnectionSettings,
) {
    tokio::spawn(async move {
        let io = IsolatedIo::new(TokioIo::new(stream));

        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);
        // One flat buffer per message keeps response heads contiguous for IsolatedIo
        builder.writev(false);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req: Request<Incoming>| {
                let handler = Arc::clone(&handler);
                async move {
                    // The body is never read; only the request head matters
                    let (parts, _) = req.into_parts();
                    let resp = handler.handle(Request::from_parts(parts, ())).await;
                    Ok::<_, Infallible>(resp)
                }
            }),
        );

        match tokio::time::timeout(settings.max_lifetime, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_debug(&format!(
                    "Connection closed after reaching its {} second maximum lifetime",
                    settings.max_lifetime.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

// Server module entry point
// Binds the listener and runs the accept loop until shutdown

pub mod connection;
pub mod io;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name (keyword), so use server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::handler::RequestHandler;
use crate::logger;

// Re-export commonly used types
pub use connection::ConnectionSettings;
pub use io::IsolatedIo;
pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::{spawn_signal_listener, Shutdown};

/// A bound server: `LISTENING` once constructed, `STOPPED` when
/// [`Server::run`] returns and the listener has been released
pub struct Server<H> {
    listener: TcpListener,
    local_addr: SocketAddr,
    handler: Arc<H>,
    settings: ConnectionSettings,
}

impl<H: RequestHandler> Server<H> {
    /// Bind the configured address.
    ///
    /// Bind failures (address in use, insufficient privilege) are returned
    /// as-is; there is no retry and no fallback port.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &Config, handler: H) -> std::io::Result<Self> {
        let addr = config
            .get_socket_addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let listener = create_listener(addr).inspect_err(|e| logger::log_bind_failed(&addr, e))?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            handler: Arc::new(handler),
            settings: ConnectionSettings::from(&config.performance),
        })
    }

    /// The address actually bound (differs from the configured one for port 0)
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Serve until `shutdown` is triggered, then release the listener
    pub async fn run(self, shutdown: Arc<Shutdown>) {
        start_server_loop(self.listener, self.handler, self.settings, shutdown).await;
    }
}

// Configuration module entry point
// Loads layered configuration (defaults, optional file, environment)

mod types;

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

// Re-export public types
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CONFIG_FILE: &str = "coi-server";
pub const ENV_PREFIX: &str = "COI";

pub(crate) fn default_server_name() -> String {
    format!("coi-server/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from the default file name (`coi-server.*`, optional)
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// The file is optional. Environment variables such as
    /// `COI_SERVER__PORT=9000` override file values.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.root", ".")?
            .set_default("http.server_name", default_server_name())?
            .set_default("http.index_files", vec!["index.html", "index.htm"])?
            .set_default("http.directory_listing", true)?
            .set_default("logging.level", "info")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.max_connection_lifetime", 75)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Resolve the bind address, preferring IPv4 when a host name maps to several
    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let host = self.server.host.as_str();
        let port = self.server.port;
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| format!("Invalid address '{host}:{port}': {e}"))?
            .collect();

        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| format!("Address '{host}:{port}' did not resolve"))
    }

    /// Canonical serving root; fails unless it names an existing directory
    pub fn get_serving_root(&self) -> io::Result<PathBuf> {
        let root = self.server.root.canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Serving root is not a directory: {}", root.display()),
            ));
        }
        Ok(root)
    }
}

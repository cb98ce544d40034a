//! Static file server for cross-origin isolated pages
//!
//! Serves a directory over HTTP/1 and adds
//! `Cross-Origin-Opener-Policy: same-origin` and
//! `Cross-Origin-Embedder-Policy: require-corp` to every response.
//!
//! ```no_run
//! use std::sync::Arc;
//! use coi_server::{Config, CrossOriginIsolation, Server, Shutdown, StaticFiles};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let handler = CrossOriginIsolation::new(StaticFiles::from_config(&config)?);
//! let server = Server::bind(&config, handler)?;
//! server.run(Arc::new(Shutdown::new())).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::Config;
pub use handler::{CrossOriginIsolation, RequestHandler, StaticFiles};
pub use server::{Server, Shutdown};

//! Request handler module
//!
//! A [`RequestHandler`] turns a request into a response. The file server is
//! one implementation ([`StaticFiles`]); [`CrossOriginIsolation`] decorates
//! any handler with the headers that opt a page into cross-origin isolation.

pub mod isolation;
pub mod listing;
pub mod static_files;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::future::Future;

pub use isolation::{apply_isolation_headers, CrossOriginIsolation};
pub use static_files::StaticFiles;

/// Resolve a request and produce a response
///
/// Request bodies are never read by a file server, so handlers receive the
/// request head only. Handlers are infallible: every failure is expressed as
/// an error status.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, req: Request<()>) -> impl Future<Output = Response<Full<Bytes>>> + Send;
}

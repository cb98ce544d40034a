//! Cross-origin isolation headers
//!
//! Browsers only expose shared-memory features to pages that are
//! cross-origin isolated, which requires both headers below on the document
//! and on the resources it loads.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Request, Response};

use super::RequestHandler;

pub const CROSS_ORIGIN_OPENER_POLICY: &str = "cross-origin-opener-policy";
pub const CROSS_ORIGIN_EMBEDDER_POLICY: &str = "cross-origin-embedder-policy";
pub const SAME_ORIGIN: &str = "same-origin";
pub const REQUIRE_CORP: &str = "require-corp";

/// Set both isolation headers, replacing any earlier values so each appears once
pub fn apply_isolation_headers(headers: &mut HeaderMap) {
    headers.insert(
        HeaderName::from_static(CROSS_ORIGIN_OPENER_POLICY),
        HeaderValue::from_static(SAME_ORIGIN),
    );
    headers.insert(
        HeaderName::from_static(CROSS_ORIGIN_EMBEDDER_POLICY),
        HeaderValue::from_static(REQUIRE_CORP),
    );
}

/// Decorator adding the isolation headers to every response of `H`,
/// whatever its status
#[derive(Debug, Clone)]
pub struct CrossOriginIsolation<H> {
    inner: H,
}

impl<H> CrossOriginIsolation<H> {
    pub const fn new(inner: H) -> Self {
        Self { inner }
    }

    pub const fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: RequestHandler> RequestHandler for CrossOriginIsolation<H> {
    async fn handle(&self, req: Request<()>) -> Response<Full<Bytes>> {
        let mut resp = self.inner.handle(req).await;
        apply_isolation_headers(resp.headers_mut());
        resp
    }
}

//! Static file serving module
//!
//! Maps request paths onto the serving root and builds file, listing,
//! redirect and error responses.

use crate::config::{Config, HttpConfig};
use crate::handler::listing;
use crate::handler::RequestHandler;
use crate::http::{self, cache, mime, path::RequestPath};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH, SERVER};
use hyper::{Method, Request, Response, StatusCode};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serves files read-only from a root directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_files: Vec<String>,
    directory_listing: bool,
    server_name: Option<HeaderValue>,
}

impl StaticFiles {
    /// Create a handler for `root`, which should already be canonical
    pub fn new(root: PathBuf, http: &HttpConfig) -> Self {
        let server_name = match HeaderValue::from_str(&http.server_name) {
            Ok(v) => Some(v),
            Err(e) => {
                logger::log_warning(&format!(
                    "Ignoring invalid server name '{}': {e}",
                    http.server_name
                ));
                None
            }
        };

        Self {
            root,
            index_files: http.index_files.clone(),
            directory_listing: http.directory_listing,
            server_name,
        }
    }

    /// Create a handler for the configured serving root
    pub fn from_config(config: &Config) -> io::Result<Self> {
        let root = config.get_serving_root()?;
        Ok(Self::new(root, &config.http))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn respond(&self, req: &Request<()>) -> Response<Full<Bytes>> {
        let is_head = match *req.method() {
            Method::GET => false,
            Method::HEAD => true,
            ref other => return http::build_501_response(other.as_str()),
        };

        let Some(request_path) = RequestPath::parse(req.uri().path()) else {
            return http::build_404_response();
        };

        let target = match self.confine(&request_path.to_fs_path(&self.root)).await {
            Ok(Some(p)) => p,
            Ok(None) => return http::build_404_response(),
            Err(resp) => return *resp,
        };

        let metadata = match fs::metadata(&target).await {
            Ok(m) => m,
            Err(e) => return io_error_response(&target, &e),
        };

        if metadata.is_dir() {
            return self.serve_directory(req, &request_path, &target, is_head).await;
        }

        // A trailing slash names a directory, never a file
        if request_path.trailing_slash {
            return http::build_404_response();
        }

        serve_file(req, &target, is_head).await
    }

    /// Canonicalize `path` and make sure it is inside the serving root
    ///
    /// `Ok(None)` means the path does not resolve (or resolves outside the
    /// root); `Err` carries a ready-made error response.
    async fn confine(&self, path: &Path) -> Result<Option<PathBuf>, Box<Response<Full<Bytes>>>> {
        let canonical = match fs::canonicalize(path).await {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(Box::new(io_error_response(path, &e)));
            }
            // Missing files are common (404), no need to log
            Err(_) => return Ok(None),
        };

        if !canonical.starts_with(&self.root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                path.display(),
                canonical.display()
            ));
            return Ok(None);
        }
        Ok(Some(canonical))
    }

    async fn serve_directory(
        &self,
        req: &Request<()>,
        request_path: &RequestPath,
        dir: &Path,
        is_head: bool,
    ) -> Response<Full<Bytes>> {
        // Relative links in the listing or index page need the trailing slash
        if !request_path.trailing_slash {
            let mut location = request_path.to_dir_uri();
            if let Some(query) = req.uri().query() {
                location.push('?');
                location.push_str(query);
            }
            return http::build_301_response(&location);
        }

        for index_file in &self.index_files {
            let candidate = dir.join(index_file);
            if !fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                continue;
            }
            return match self.confine(&candidate).await {
                Ok(Some(index)) => serve_file(req, &index, is_head).await,
                Ok(None) => http::build_404_response(),
                Err(resp) => *resp,
            };
        }

        if !self.directory_listing {
            return http::build_403_response();
        }

        match listing::render_listing(dir, &request_path.decoded).await {
            Ok(html) => http::build_html_response(html, is_head),
            Err(e) => {
                logger::log_warning(&format!(
                    "Failed to list directory '{}': {e}",
                    dir.display()
                ));
                http::response::build_error_response(
                    StatusCode::NOT_FOUND,
                    "404 No permission to list directory",
                )
            }
        }
    }
}

impl RequestHandler for StaticFiles {
    async fn handle(&self, req: Request<()>) -> Response<Full<Bytes>> {
        let mut resp = self.respond(&req).await;
        if let Some(name) = &self.server_name {
            resp.headers_mut().insert(SERVER, name.clone());
        }
        resp
    }
}

/// Serve a regular file, honouring `If-Modified-Since`
///
/// The conditional check runs on metadata alone; the file is only read
/// when a full response is due.
async fn serve_file(req: &Request<()>, path: &Path, is_head: bool) -> Response<Full<Bytes>> {
    let metadata = match fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => return io_error_response(path, &e),
    };
    let modified = metadata.modified().ok();
    let last_modified = modified.map(cache::format_http_date);

    if let Some(mtime) = modified {
        if cache::is_not_modified(
            header_str(req, &IF_MODIFIED_SINCE),
            header_str(req, &IF_NONE_MATCH),
            mtime,
        ) {
            return http::build_304_response(last_modified.as_deref().unwrap_or_default());
        }
    }

    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => return io_error_response(path, &e),
    };

    http::build_file_response(
        Bytes::from(content),
        mime::content_type_for(path),
        last_modified.as_deref(),
        is_head,
    )
}

/// Map a filesystem error to a response: missing entries are 404, anything
/// else (permissions, I/O) is a server error
fn io_error_response(path: &Path, err: &io::Error) -> Response<Full<Bytes>> {
    if err.kind() == io::ErrorKind::NotFound {
        return http::build_404_response();
    }
    logger::log_error(&format!("Failed to read '{}': {err}", path.display()));
    http::build_500_response()
}

fn header_str<'a>(req: &'a Request<()>, name: &HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LOCATION};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, StaticFiles) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::create_dir_all(root.join("app")).unwrap();
        std::fs::write(root.join("hello.txt"), b"hello world").unwrap();
        std::fs::write(root.join("main.js"), b"console.log(1);").unwrap();
        std::fs::write(root.join("docs/guide.md"), b"# guide").unwrap();
        std::fs::write(root.join("app/index.html"), b"<p>app</p>").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();

        let handler = StaticFiles::new(root.canonicalize().unwrap(), &HttpConfig::default());
        (dir, handler)
    }

    async fn get(handler: &StaticFiles, uri: &str) -> Response<Full<Bytes>> {
        let req = Request::builder().uri(uri).body(()).unwrap();
        handler.handle(req).await
    }

    async fn body(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_file() {
        let (_dir, handler) = fixture();
        let resp = get(&handler, "/hello.txt").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "11");
        assert!(resp.headers().contains_key(LAST_MODIFIED));
        assert!(resp.headers()[SERVER].to_str().unwrap().starts_with("coi-server/"));
        assert_eq!(body(resp).await, Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_query_string_ignored() {
        let (_dir, handler) = fixture();
        let resp = get(&handler, "/main.js?v=3").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/javascript");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (_dir, handler) = fixture();
        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/hello.txt")
            .body(())
            .unwrap();
        let resp = handler.handle(req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "11");
        assert!(body(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_dir, handler) = fixture();
        assert_eq!(get(&handler, "/nope.txt").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get(&handler, "/hello.txt/child").await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_file_with_trailing_slash() {
        let (_dir, handler) = fixture();
        assert_eq!(get(&handler, "/hello.txt/").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_stays_in_root() {
        let (_dir, handler) = fixture();
        for uri in ["/../secret.txt", "/docs/../../secret.txt", "/%2e%2e/secret.txt"] {
            let resp = get(&handler, uri).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_ne!(body(resp).await, Bytes::from_static(b"top secret"));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_blocked() {
        let (dir, handler) = fixture();
        std::os::unix::fs::symlink(
            dir.path().join("secret.txt"),
            handler.root().join("leak.txt"),
        )
        .unwrap();
        assert_eq!(get(&handler, "/leak.txt").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_directory_redirect_keeps_query() {
        let (_dir, handler) = fixture();
        let resp = get(&handler, "/docs?x=1").await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "/docs/?x=1");
    }

    #[tokio::test]
    async fn test_directory_redirect_is_never_protocol_relative() {
        let (_dir, handler) = fixture();
        std::fs::create_dir(handler.root().join("evil.com")).unwrap();

        let resp = get(&handler, "//docs").await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "/docs/");

        for (uri, location) in [
            ("//evil.com", "/evil.com/"),
            ("///evil.com?x=1", "/evil.com/?x=1"),
            ("/./evil.com", "/evil.com/"),
        ] {
            let resp = get(&handler, uri).await;
            assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY, "{uri}");
            assert_eq!(resp.headers()[LOCATION], location, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_directory_index_file() {
        let (_dir, handler) = fixture();
        let resp = get(&handler, "/app/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body(resp).await, Bytes::from_static(b"<p>app</p>"));
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let (_dir, handler) = fixture();
        let resp = get(&handler, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(body(resp).await.to_vec()).unwrap();
        assert!(html.contains("Directory listing for /"));
        assert!(html.contains("href=\"docs/\""));
        assert!(html.contains("href=\"hello.txt\""));
    }

    #[tokio::test]
    async fn test_directory_listing_disabled() {
        let (dir, _) = fixture();
        let http = HttpConfig {
            directory_listing: false,
            ..HttpConfig::default()
        };
        let handler = StaticFiles::new(dir.path().join("site").canonicalize().unwrap(), &http);
        assert_eq!(get(&handler, "/docs/").await.status(), StatusCode::FORBIDDEN);
        // Index files still win
        assert_eq!(get(&handler, "/app/").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let (_dir, handler) = fixture();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/hello.txt")
            .body(())
            .unwrap();
        let resp = handler.handle(req).await;
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
        assert!(resp.headers().contains_key(SERVER));
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let (_dir, handler) = fixture();
        let first = get(&handler, "/hello.txt").await;
        let stamp = first.headers()[LAST_MODIFIED].clone();

        let req = Request::builder()
            .uri("/hello.txt")
            .header(IF_MODIFIED_SINCE, stamp.clone())
            .body(())
            .unwrap();
        let resp = handler.handle(req).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert!(body(resp).await.is_empty());

        let req = Request::builder()
            .uri("/hello.txt")
            .header(IF_MODIFIED_SINCE, "Thu, 01 Jan 1970 00:00:00 GMT")
            .body(())
            .unwrap();
        assert_eq!(handler.handle(req).await.status(), StatusCode::OK);

        let req = Request::builder()
            .uri("/hello.txt")
            .header(IF_MODIFIED_SINCE, stamp)
            .header(IF_NONE_MATCH, "\"abc\"")
            .body(())
            .unwrap();
        assert_eq!(handler.handle(req).await.status(), StatusCode::OK);
    }

    #[test]
    fn test_io_error_mapping() {
        let path = Path::new("/srv/site/locked.bin");

        let resp = io_error_response(path, &io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = io_error_response(path, &io::Error::other("disk on fire"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = io_error_response(path, &io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_server_error() {
        let (_dir, handler) = fixture();
        // Reading a directory as a file fails even when running as root
        let target = handler.root().join("docs");
        let req = Request::builder().uri("/docs").body(()).unwrap();
        let resp = serve_file(&req, &target, false).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_not_modified_skips_reading_file() {
        let (_dir, handler) = fixture();
        // A directory has an mtime but cannot be read: a 304 proves no read happened
        let target = handler.root().join("docs");
        let mtime = std::fs::metadata(&target).unwrap().modified().unwrap();
        let req = Request::builder()
            .uri("/docs")
            .header(IF_MODIFIED_SINCE, cache::format_http_date(mtime))
            .body(())
            .unwrap();
        let resp = serve_file(&req, &target, false).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert!(body(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_from_config_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.root = dir.path().join("missing");
        assert!(StaticFiles::from_config(&config).is_err());

        config.server.root = dir.path().to_path_buf();
        let handler = StaticFiles::from_config(&config).unwrap();
        assert_eq!(handler.root(), dir.path().canonicalize().unwrap());
    }
}

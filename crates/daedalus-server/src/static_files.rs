//! Static file serving.
//!
//! Files are read from a root directory with index fallback, cache headers
//! (`Cache-Control`, `ETag`, `Last-Modified`) and protection against
//! directory traversal.
//!
//! # Example
//!
//! ```rust
//! use daedalus_server::static_files::StaticFiles;
//!
//! let files = StaticFiles::new("./public")
//!     .index("index.html")
//!     .cache_control("max-age=3600");
//! assert_eq!(files.index_file(), Some("index.html"));
//! ```

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use daedalus_core::{empty, full, HttpResponse};
use http::{header, HeaderMap, Method, Request, Response, StatusCode};
use thiserror::Error;

/// Errors that can occur when serving static files.
#[derive(Debug, Error)]
pub enum StaticFileError {
    /// The requested file was not found.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The path is forbidden (traversal, hidden file).
    #[error("Forbidden path: {0}")]
    Forbidden(String),

    /// Only `GET` and `HEAD` are served.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// I/O error while reading file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StaticFileError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_response(self) -> HttpResponse {
        let status = self.status_code();
        let mut response = Response::new(full(status.canonical_reason().unwrap_or_default()));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

/// A directory served over HTTP.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: Option<String>,
    cache_control: Option<String>,
    etag_enabled: bool,
    last_modified_enabled: bool,
    serve_hidden: bool,
}

impl StaticFiles {
    /// Serves files below `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index_file: None,
            cache_control: None,
            etag_enabled: true,
            last_modified_enabled: true,
            serve_hidden: false,
        }
    }

    /// File served when a directory is requested.
    #[must_use]
    pub fn index<S: Into<String>>(mut self, index: S) -> Self {
        self.index_file = Some(index.into());
        self
    }

    /// `Cache-Control` value attached to every file.
    #[must_use]
    pub fn cache_control<S: Into<String>>(mut self, value: S) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Toggles `ETag` headers and `If-None-Match` handling.
    #[must_use]
    pub const fn etag(mut self, enabled: bool) -> Self {
        self.etag_enabled = enabled;
        self
    }

    /// Toggles `Last-Modified` headers and `If-Modified-Since` handling.
    #[must_use]
    pub const fn last_modified(mut self, enabled: bool) -> Self {
        self.last_modified_enabled = enabled;
        self
    }

    /// Allows files whose name starts with a dot.
    #[must_use]
    pub const fn serve_hidden(mut self, enabled: bool) -> Self {
        self.serve_hidden = enabled;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the index file name.
    #[must_use]
    pub fn index_file(&self) -> Option<&str> {
        self.index_file.as_deref()
    }

    /// Serves `request`, treating the part of its path after `prefix` as
    /// the file path. Failures become plain-text error responses.
    #[must_use]
    pub fn serve_under(&self, prefix: &str, request: &Request<Bytes>) -> HttpResponse {
        let path = request.uri().path();
        let relative = path.strip_prefix(prefix).unwrap_or(path);

        match self.handle(relative, request.headers(), request.method()) {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(path = %path, error = %err, "Static file not served");
                err.into_response()
            }
        }
    }

    /// Serves the file at `request_path` relative to the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the method is not `GET`/`HEAD`, the path escapes
    /// the root or names a hidden file, the file does not exist, or reading
    /// it fails.
    pub fn handle(
        &self,
        request_path: &str,
        headers: &HeaderMap,
        method: &Method,
    ) -> Result<HttpResponse, StaticFileError> {
        if method != Method::GET && method != Method::HEAD {
            return Err(StaticFileError::MethodNotAllowed);
        }

        let file_path = self.resolve_path(request_path)?;

        if file_path.is_dir() {
            let index = self
                .index_file
                .as_ref()
                .map(|index| file_path.join(index))
                .filter(|path| path.is_file())
                .ok_or_else(|| StaticFileError::NotFound(request_path.to_string()))?;
            return self.serve_file(&index, headers, method);
        }

        self.serve_file(&file_path, headers, method)
    }

    fn resolve_path(&self, request_path: &str) -> Result<PathBuf, StaticFileError> {
        let path = request_path.trim_start_matches('/');

        for component in Path::new(path).components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StaticFileError::Forbidden(
                        "Directory traversal not allowed".to_string(),
                    ));
                }
                Component::Normal(name) => {
                    let hidden = name.to_str().is_some_and(|n| n.starts_with('.'));
                    if hidden && !self.serve_hidden {
                        return Err(StaticFileError::Forbidden(
                            "Hidden files not allowed".to_string(),
                        ));
                    }
                }
                Component::CurDir => {}
            }
        }

        let canonical = self
            .root
            .join(path)
            .canonicalize()
            .map_err(|_| StaticFileError::NotFound(request_path.to_string()))?;

        let canonical_root = self.root.canonicalize().map_err(|e| {
            StaticFileError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Root directory not found: {e}"),
            ))
        })?;

        if !canonical.starts_with(&canonical_root) {
            return Err(StaticFileError::Forbidden(
                "Path escapes root directory".to_string(),
            ));
        }

        Ok(canonical)
    }

    fn serve_file(
        &self,
        path: &Path,
        headers: &HeaderMap,
        method: &Method,
    ) -> Result<HttpResponse, StaticFileError> {
        let metadata = std::fs::metadata(path)?;
        let modified = metadata.modified().ok();

        let etag = if self.etag_enabled {
            modified.map(|m| etag_for(metadata.len(), m))
        } else {
            None
        };

        if let Some(etag) = &etag {
            let matches = headers
                .get(header::IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == etag || v == "*");
            if matches {
                return Ok(self.not_modified(Some(etag)));
            }
        }

        if self.last_modified_enabled {
            if let (Some(modified), Some(since)) = (modified, if_modified_since(headers)) {
                if unix_secs(modified) <= unix_secs(since) {
                    return Ok(self.not_modified(etag.as_deref()));
                }
            }
        }

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime_type(path))
            .header(header::CONTENT_LENGTH, metadata.len());

        if let Some(cache_control) = &self.cache_control {
            builder = builder.header(header::CACHE_CONTROL, cache_control.as_str());
        }
        if let Some(etag) = &etag {
            builder = builder.header(header::ETAG, etag.as_str());
        }
        if self.last_modified_enabled {
            if let Some(modified) = modified {
                builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
            }
        }

        let body = if method == Method::HEAD {
            empty()
        } else {
            full(std::fs::read(path)?)
        };

        builder
            .body(body)
            .map_err(|e| StaticFileError::IoError(std::io::Error::other(e.to_string())))
    }

    fn not_modified(&self, etag: Option<&str>) -> HttpResponse {
        let mut response = Response::new(empty());
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        if let Some(value) = etag.and_then(|e| header::HeaderValue::from_str(e).ok()) {
            response.headers_mut().insert(header::ETAG, value);
        }
        if let Some(value) = self
            .cache_control
            .as_deref()
            .and_then(|c| header::HeaderValue::from_str(c).ok())
        {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
        response
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn etag_for(len: u64, modified: SystemTime) -> String {
    format!("\"{len:x}-{:x}\"", unix_secs(modified))
}

fn if_modified_since(headers: &HeaderMap) -> Option<SystemTime> {
    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
}

fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "webmanifest" => "application/manifest+json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(dir.path().join("app.css"), "body{}").unwrap();
        fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/logo.svg"), "<svg/>").unwrap();
        dir
    }

    async fn body(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serve_file() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let response = files.handle("/app.css", &HeaderMap::new(), &Method::GET).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
        assert!(response.headers().contains_key(header::ETAG));
        assert!(response.headers().contains_key(header::LAST_MODIFIED));
        assert_eq!(&body(response).await[..], b"body{}");
    }

    #[test]
    fn test_subdirectory_file() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());
        let response = files.handle("img/logo.svg", &HeaderMap::new(), &Method::GET).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    }

    #[test]
    fn test_directory_index() {
        let dir = create_test_dir();
        let with_index = StaticFiles::new(dir.path()).index("index.html");
        assert!(with_index.handle("/", &HeaderMap::new(), &Method::GET).is_ok());

        let without_index = StaticFiles::new(dir.path());
        assert!(matches!(
            without_index.handle("/", &HeaderMap::new(), &Method::GET),
            Err(StaticFileError::NotFound(_))
        ));
    }

    #[test]
    fn test_traversal_blocked() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path().join("img"));
        let err = files
            .handle("../index.html", &HeaderMap::new(), &Method::GET)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_hidden_files() {
        let dir = create_test_dir();
        let err = StaticFiles::new(dir.path())
            .handle("/.env", &HeaderMap::new(), &Method::GET)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        assert!(StaticFiles::new(dir.path())
            .serve_hidden(true)
            .handle("/.env", &HeaderMap::new(), &Method::GET)
            .is_ok());
    }

    #[test]
    fn test_missing_file_is_404() {
        let dir = create_test_dir();
        let err = StaticFiles::new(dir.path())
            .handle("/nope.js", &HeaderMap::new(), &Method::GET)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_method_not_allowed() {
        let dir = create_test_dir();
        let err = StaticFiles::new(dir.path())
            .handle("/app.css", &HeaderMap::new(), &Method::POST)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = create_test_dir();
        let response = StaticFiles::new(dir.path())
            .handle("/app.css", &HeaderMap::new(), &Method::HEAD)
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "6");
        assert!(body(response).await.is_empty());
    }

    #[test]
    fn test_if_none_match_returns_304() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path()).cache_control("max-age=60");
        let first = files.handle("/app.css", &HeaderMap::new(), &Method::GET).unwrap();
        let etag = first.headers()[header::ETAG].clone();

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, etag);
        let second = files.handle("/app.css", &headers, &Method::GET).unwrap();
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(second.headers()[header::CACHE_CONTROL], "max-age=60");
    }

    #[test]
    fn test_serve_under_strips_prefix() {
        let dir = create_test_dir();
        let files = StaticFiles::new(dir.path());

        let request = Request::get("/assets/app.css").body(Bytes::new()).unwrap();
        assert_eq!(files.serve_under("/assets", &request).status(), StatusCode::OK);

        let request = Request::get("/assets/missing.css").body(Bytes::new()).unwrap();
        assert_eq!(files.serve_under("/assets", &request).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_mime_type_detection() {
        assert_eq!(mime_type(Path::new("a.HTML")), "text/html; charset=utf-8");
        assert_eq!(mime_type(Path::new("a.wasm")), "application/wasm");
        assert_eq!(mime_type(Path::new("a")), "application/octet-stream");
    }
}

//! Per-request context.
//!
//! A [`Context`] is created by the dispatcher for every inbound request and
//! handed by mutable reference through the middleware chain into the route
//! handler. It owns the buffered request, the response under construction
//! and the continuation flag that decides whether the chain proceeds.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use daedalus_router::Params;
use daedalus_sse::{SseConfig, SseEvent, SseSender};
use http::header::{CONTENT_TYPE, LOCATION, REFERER};
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::decode::decode_body;
use crate::error::{Error, Result};
use crate::render::Render;
use crate::response::{full, HttpResponse};
use crate::signal::Disconnect;
use crate::url::RouteIndex;
use crate::validate::{Decoded, Validate};

/// Header set by htmx on requests it issues.
pub const HX_REQUEST: &str = "hx-request";

/// Response header telling htmx to navigate.
pub const HX_REDIRECT: &str = "hx-redirect";

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request easy to
/// find and sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How (and whether) the response can be streamed.
enum Streaming {
    /// No transport is attached that can flush partial bodies.
    Unsupported,
    /// The transport is waiting for an early response head.
    Ready(oneshot::Sender<HttpResponse>, SseConfig),
    /// The head is out; events go through the sender.
    Active(SseSender),
}

/// The per-request handle passed through middleware and into handlers.
///
/// # Example
///
/// ```
/// use daedalus_core::Context;
/// use http::{Request, StatusCode};
/// use bytes::Bytes;
///
/// let request = Request::get("/posts/7").body(Bytes::new()).unwrap();
/// let mut ctx = Context::new(request);
///
/// assert_eq!(ctx.status(), StatusCode::OK);
/// ctx.send_text("hello", StatusCode::CREATED).unwrap();
///
/// let response = ctx.into_response().unwrap();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```
pub struct Context {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: Params,
    extensions: Extensions,

    status: StatusCode,
    response_headers: HeaderMap,
    response_body: Bytes,
    written: bool,
    streaming: Streaming,

    proceed: bool,
    routes: Arc<RouteIndex>,
    disconnect: Disconnect,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("status", &self.status)
            .field("written", &self.written)
            .field("proceed", &self.proceed)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a context for a buffered request.
    ///
    /// The context starts with status 200, no route parameters, an empty
    /// route index and no streaming transport.
    pub fn new(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            request_id: RequestId::new(),
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: Params::new(),
            extensions: parts.extensions,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_body: Bytes::new(),
            written: false,
            streaming: Streaming::Unsupported,
            proceed: false,
            routes: Arc::new(RouteIndex::new()),
            disconnect: Disconnect::new(),
        }
    }

    /// Attaches the captured path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Attaches the shared route index used by [`make_url`](Self::make_url).
    #[must_use]
    pub fn with_routes(mut self, routes: Arc<RouteIndex>) -> Self {
        self.routes = routes;
        self
    }

    /// Attaches a streaming transport.
    ///
    /// When the handler starts an event stream, the response head is sent
    /// through `commit` right away and the body keeps flowing afterwards.
    #[must_use]
    pub fn with_streaming(mut self, commit: oneshot::Sender<HttpResponse>, config: SseConfig) -> Self {
        self.streaming = Streaming::Ready(commit, config);
        self
    }

    /// Attaches the signal fired when the client disconnects.
    #[must_use]
    pub fn with_disconnect(mut self, disconnect: Disconnect) -> Self {
        self.disconnect = disconnect;
        self
    }

    // ---- request -------------------------------------------------------

    /// Returns the request ID.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a request header as text. Missing or non-text values are
    /// `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the buffered request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns all captured path parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the path parameter named `key`.
    pub fn path_value(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// Request-scoped values shared between middleware and handlers.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to the request-scoped values.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Decodes the payload into `T`, then validates it.
    ///
    /// JSON bodies are used when the request says `application/json`;
    /// otherwise form fields are decoded. A body that cannot be decoded is
    /// reported as [`Decoded::Malformed`] rather than as a validation pass.
    pub fn decode_and_validate<T>(&self) -> Decoded<T>
    where
        T: DeserializeOwned + Validate,
    {
        let value: T = match decode_body(&self.headers, self.query(), &self.body) {
            Ok(value) => value,
            Err(err) => return Decoded::Malformed(err),
        };

        let errors = value.field_errors();
        if errors.is_empty() {
            Decoded::Valid(value)
        } else {
            Decoded::Invalid(value, errors)
        }
    }

    /// Builds a URL for a named route.
    pub fn make_url(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        self.routes.make_url(name, params)
    }

    /// Resolves when the client has gone away.
    pub async fn closed(&self) {
        match &self.streaming {
            Streaming::Active(sender) => {
                tokio::select! {
                    () = sender.closed() => {}
                    () = self.disconnect.wait() => {}
                }
            }
            _ => self.disconnect.wait().await,
        }
    }

    /// Returns true once the client is known to be gone.
    pub fn is_closed(&self) -> bool {
        match &self.streaming {
            Streaming::Active(sender) => sender.is_closed() || self.disconnect.is_fired(),
            _ => self.disconnect.is_fired(),
        }
    }

    // ---- continuation ----------------------------------------------------

    /// Lets the chain proceed past the current middleware.
    pub fn next(&mut self) {
        self.proceed = true;
    }

    /// Returns true if the current middleware called [`next`](Self::next).
    pub fn should_continue(&self) -> bool {
        self.proceed
    }

    /// Clears the continuation flag. The dispatcher calls this before every
    /// middleware.
    pub fn reset_continuation(&mut self) {
        self.proceed = false;
    }

    // ---- response --------------------------------------------------------

    /// Returns the response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the response status.
    pub fn with_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Returns the response headers written so far.
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Sets a response header, replacing earlier values.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.response_headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Returns true once a status line and body have been committed.
    pub fn is_written(&self) -> bool {
        self.written
    }

    /// Returns true once an event stream has started.
    pub fn is_streaming(&self) -> bool {
        matches!(self.streaming, Streaming::Active(_))
    }

    fn write(&mut self, content_type: &'static str, status: StatusCode, body: Bytes) -> Result<()> {
        if self.written {
            tracing::warn!(
                request_id = %self.request_id,
                path = %self.uri.path(),
                "Response already written, ignoring second write"
            );
            return Err(Error::ResponseAlreadyWritten);
        }
        self.response_headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.status = status;
        self.response_body = body;
        self.written = true;
        Ok(())
    }

    /// Writes `value` as a JSON response.
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T, status: StatusCode) -> Result<()> {
        if self.written {
            return Err(Error::ResponseAlreadyWritten);
        }
        let body = serde_json::to_vec(value)?;
        self.write("application/json", status, Bytes::from(body))
    }

    /// Writes a plain text response.
    pub fn send_text(&mut self, text: impl Into<String>, status: StatusCode) -> Result<()> {
        self.write("text/plain; charset=utf-8", status, Bytes::from(text.into()))
    }

    /// Writes an HTML response.
    pub fn send_html(&mut self, html: impl Into<String>, status: StatusCode) -> Result<()> {
        self.write("text/html; charset=utf-8", status, Bytes::from(html.into()))
    }

    /// Renders `component` as HTML with the current status.
    pub fn render<R: Render + ?Sized>(&mut self, component: &R) -> Result<()> {
        let html = component.render()?;
        let status = self.status;
        self.send_html(html, status)
    }

    /// Redirects the client to `to` with `303 See Other`.
    ///
    /// Requests made by htmx (`HX-Request: true`) get an `HX-Redirect`
    /// header instead of `Location`, and the body stays open. An empty
    /// target redirects to `/`.
    pub fn redirect(&mut self, to: &str) -> Result<()> {
        let target = if to.is_empty() { "/" } else { to };
        let value = HeaderValue::from_str(target).map_err(|e| Error::InvalidHeader {
            name: LOCATION.to_string(),
            reason: e.to_string(),
        })?;

        if self.header(HX_REQUEST) == Some("true") {
            self.status = StatusCode::SEE_OTHER;
            self.response_headers
                .insert(HeaderName::from_static(HX_REDIRECT), value);
            return Ok(());
        }

        if self.written {
            return Err(Error::ResponseAlreadyWritten);
        }
        self.status = StatusCode::SEE_OTHER;
        self.response_headers.insert(LOCATION, value);
        self.written = true;
        Ok(())
    }

    /// Redirects to the `Referer` of the request.
    pub fn redirect_back(&mut self) -> Result<()> {
        let back = self.header(REFERER.as_str()).unwrap_or_default().to_string();
        self.redirect(&back)
    }

    /// Commits the event-stream response head.
    ///
    /// Calling it again after the stream started is a no-op.
    pub fn set_sse_headers(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.streaming, Streaming::Unsupported) {
            Streaming::Active(sender) => {
                self.streaming = Streaming::Active(sender);
                Ok(())
            }
            Streaming::Unsupported => Err(Error::StreamingUnsupported),
            Streaming::Ready(commit, config) => {
                if self.written {
                    self.streaming = Streaming::Ready(commit, config);
                    return Err(Error::ResponseAlreadyWritten);
                }

                daedalus_sse::apply_headers(&mut self.response_headers);
                let (sender, stream) = daedalus_sse::channel(&config);

                let mut head = Response::new(stream.into_body());
                *head.status_mut() = self.status;
                *head.headers_mut() = self.response_headers.clone();

                commit.send(head).map_err(|_| Error::ClientDisconnected)?;
                self.streaming = Streaming::Active(sender);
                self.written = true;
                Ok(())
            }
        }
    }

    /// Sends one named event and flushes it to the client.
    ///
    /// Starts the stream first if needed.
    pub async fn send_sse(&mut self, event: &str, data: &str) -> Result<()> {
        self.set_sse_headers()?;
        let Streaming::Active(sender) = &self.streaming else {
            return Err(Error::StreamingUnsupported);
        };
        sender.send(&SseEvent::named(event, data)).await?;
        Ok(())
    }

    /// Finishes the request.
    ///
    /// Returns `None` when the response already left through an event
    /// stream. Otherwise returns the buffered response; if nothing was
    /// written it carries the current status and an empty body.
    pub fn into_response(self) -> Option<HttpResponse> {
        if matches!(self.streaming, Streaming::Active(_)) {
            return None;
        }
        let mut response = Response::new(full(self.response_body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.response_headers;
        Some(response)
    }
}

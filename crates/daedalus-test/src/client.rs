//! In-memory client.

use std::sync::Arc;

use daedalus_server::{DispatchTable, Router, RouterError};
use http::Method;

use crate::error::TestError;
use crate::request::TestRequest;
use crate::response::TestResponse;

/// Sends requests straight into a [`DispatchTable`], no sockets involved.
///
/// Requests take the same path as over the wire: global and route
/// middleware, the error handler, and event streams all behave as they
/// would behind the server.
///
/// # Example
///
/// ```
/// use daedalus_core::handler_fn;
/// use daedalus_server::Router;
/// use daedalus_test::TestClient;
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let mut router = Router::new();
/// router.get("/", handler_fn(|ctx| Box::pin(async move {
///     ctx.send_text("home", StatusCode::OK)
/// })));
///
/// let client = TestClient::from_router(router).unwrap();
/// client.get("/").send().await.assert_body_eq("home");
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    table: Arc<DispatchTable>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for a compiled table.
    pub fn new(table: DispatchTable) -> Self {
        Self {
            table: Arc::new(table),
            default_headers: Vec::new(),
        }
    }

    /// Compiles `router` and creates a client for it.
    ///
    /// # Errors
    ///
    /// Returns the compile error of the router.
    pub fn from_router(router: Router) -> Result<Self, RouterError> {
        Ok(Self::new(router.compile()?))
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the table requests are sent to.
    #[must_use]
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Starts a `GET` request.
    pub fn get(&self, uri: impl Into<String>) -> PendingRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(&self, uri: impl Into<String>) -> PendingRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, uri: impl Into<String>) -> PendingRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a `PATCH` request.
    pub fn patch(&self, uri: impl Into<String>) -> PendingRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, uri: impl Into<String>) -> PendingRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> PendingRequest<'_> {
        let request = self
            .default_headers
            .iter()
            .fold(TestRequest::new(method, uri), |req, (name, value)| req.header(name, value));
        PendingRequest { client: self, request }
    }

    /// Dispatches a built request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the body cannot be read.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let request = request.build()?;
        let response = self.table.dispatch(request).await;
        TestResponse::from_http(response).await
    }
}

/// A request bound to a [`TestClient`], ready to send.
#[must_use]
#[derive(Debug)]
pub struct PendingRequest<'a> {
    client: &'a TestClient,
    request: TestRequest,
}

impl PendingRequest<'_> {
    /// Adds a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    /// Marks the request as coming from htmx.
    pub fn htmx(mut self) -> Self {
        self.request = self.request.htmx();
        self
    }

    /// Sets the `Referer` header.
    pub fn referer(mut self, url: impl AsRef<str>) -> Self {
        self.request = self.request.referer(url);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.request = self.request.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.request = self.request.json(value);
        self
    }

    /// Sets a form body.
    pub fn form<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.request = self.request.form(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request is invalid; use [`try_send`](Self::try_send) to
    /// handle that case.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request and reports build or read errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the body cannot be read.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        self.client.execute(self.request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::{handler_fn, StatusError};
    use http::StatusCode;
    use serde_json::json;

    fn client() -> TestClient {
        let mut router = Router::new();
        router.get(
            "/echo-header",
            handler_fn(|ctx| {
                Box::pin(async move {
                    let value = ctx.header("x-custom").unwrap_or("none").to_string();
                    ctx.send_text(value, StatusCode::OK)
                })
            }),
        );
        router.post(
            "/echo-body",
            handler_fn(|ctx| {
                Box::pin(async move {
                    let body = String::from_utf8_lossy(ctx.body()).into_owned();
                    ctx.send_text(body, StatusCode::OK)
                })
            }),
        );
        router.post(
            "/go",
            handler_fn(|ctx| Box::pin(async move { ctx.redirect("/done") })),
        );
        router.get(
            "/forbidden",
            handler_fn(|_ctx| Box::pin(async { Err(StatusError::forbidden().into()) })),
        );
        router.get(
            "/stream",
            handler_fn(|ctx| {
                Box::pin(async move {
                    ctx.send_sse("tick", "1").await?;
                    ctx.send_sse("tick", "2").await?;
                    Ok(())
                })
            }),
        );
        TestClient::from_router(router).unwrap()
    }

    #[tokio::test]
    async fn test_default_header() {
        let client = client().with_default_header("X-Custom", "default");
        client.get("/echo-header").send().await.assert_body_eq("default");
    }

    #[tokio::test]
    async fn test_json_and_form_bodies() {
        let client = client();
        client
            .post("/echo-body")
            .json(&json!({"a": 1}))
            .send()
            .await
            .assert_body_eq(r#"{"a":1}"#);
        client
            .post("/echo-body")
            .form(&[("a", "1")])
            .send()
            .await
            .assert_body_eq("a=1");
    }

    #[tokio::test]
    async fn test_redirects() {
        let client = client();
        let plain = client.post("/go").send().await;
        plain.assert_redirect("/done");
        assert!(plain.header("hx-redirect").is_none());

        let htmx = client.post("/go").htmx().send().await;
        htmx.assert_redirect("/done").assert_header("hx-redirect", "/done");
        assert!(htmx.header("location").is_none());
    }

    #[tokio::test]
    async fn test_error_handler_output() {
        client()
            .get("/forbidden")
            .send()
            .await
            .assert_status(StatusCode::FORBIDDEN)
            .assert_json_field("code", &json!(403));
    }

    #[tokio::test]
    async fn test_event_stream() {
        let response = client().get("/stream").send().await;
        response.assert_header("content-type", "text/event-stream");
        let data: Vec<_> = response.sse_events().into_iter().map(|e| e.data).collect();
        assert_eq!(data, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_try_send_reports_invalid_request() {
        let err = client()
            .get("/echo-header")
            .header("bad name", "x")
            .try_send()
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader { .. }));
    }
}

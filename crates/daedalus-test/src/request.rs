//! Test request building.

use bytes::Bytes;
use daedalus_core::HX_REQUEST;
use http::header::{CONTENT_TYPE, REFERER};
use http::{HeaderName, HeaderValue, Method, Request, Uri};
use serde::Serialize;

use crate::error::TestError;

/// Builder for an in-memory request.
///
/// Problems such as a malformed header are remembered and reported by
/// [`build`](Self::build), so the builder chain itself never panics.
#[must_use]
#[derive(Debug)]
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequest {
    /// Creates a request with the given method.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Creates a `POST` request.
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Creates a `PUT` request.
    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// Creates a `PATCH` request.
    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(Method::PATCH, uri)
    }

    /// Creates a `DELETE` request.
    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Adds a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let parsed = HeaderName::try_from(name).map_err(|e| e.to_string()).and_then(|n| {
            HeaderValue::try_from(value.as_ref())
                .map(|v| (n, v))
                .map_err(|e| e.to_string())
        });

        match parsed {
            Ok(pair) => self.headers.push(pair),
            Err(reason) => self.fail(TestError::InvalidHeader {
                name: name.to_string(),
                reason,
            }),
        }
        self
    }

    /// Marks the request as coming from htmx.
    pub fn htmx(self) -> Self {
        self.header(HX_REQUEST, "true")
    }

    /// Sets the `Referer` header.
    pub fn referer(self, url: impl AsRef<str>) -> Self {
        self.header(REFERER.as_str(), url)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.fail(TestError::Encode(e.to_string())),
        }
        self.header(CONTENT_TYPE.as_str(), "application/json")
    }

    /// Sets a form body and `Content-Type: application/x-www-form-urlencoded`.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Bytes::from(encoded),
            Err(e) => self.fail(TestError::Encode(e.to_string())),
        }
        self.header(CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded")
    }

    fn fail(&mut self, error: TestError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns the first problem recorded while building, or an invalid URI.
    pub fn build(self) -> Result<Request<Bytes>, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri: Uri = self.uri.parse().map_err(|e: http::uri::InvalidUri| TestError::InvalidUri {
            uri: self.uri.clone(),
            reason: e.to_string(),
        })?;

        let mut request = Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        for (name, value) in self.headers {
            request.headers_mut().append(name, value);
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_and_uri() {
        let request = TestRequest::delete("/posts/1?force=true").build().unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.uri().path(), "/posts/1");
        assert_eq!(request.uri().query(), Some("force=true"));
    }

    #[test]
    fn test_htmx_and_referer() {
        let request = TestRequest::post("/login")
            .htmx()
            .referer("/previous")
            .build()
            .unwrap();
        assert_eq!(request.headers()["hx-request"], "true");
        assert_eq!(request.headers()["referer"], "/previous");
    }

    #[test]
    fn test_json_body() {
        let request = TestRequest::post("/posts")
            .json(&json!({"Name": "hello"}))
            .build()
            .unwrap();
        assert_eq!(request.headers()["content-type"], "application/json");
        assert_eq!(request.body().as_ref(), br#"{"Name":"hello"}"#);
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/posts")
            .form(&[("Name", "a b"), ("Rating", "5")])
            .build()
            .unwrap();
        assert_eq!(
            request.headers()["content-type"],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body().as_ref(), b"Name=a+b&Rating=5");
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let err = TestRequest::get("/").header("bad name", "x").build().unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader { ref name, .. } if name == "bad name"));
    }

    #[test]
    fn test_invalid_uri() {
        let err = TestRequest::get("http://[::1").build().unwrap_err();
        assert!(matches!(err, TestError::InvalidUri { .. }));
    }
}

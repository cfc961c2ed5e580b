//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use daedalus_core::{HttpResponse, HX_REDIRECT};
use http::header::LOCATION;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// One parsed Server-Sent Events frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field, if present.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
    /// `id:` field, if present.
    pub id: Option<String>,
}

impl SseFrame {
    fn parse(raw: &str) -> Option<Self> {
        let mut frame = Self::default();
        let mut data = Vec::new();
        let mut seen = false;

        for line in raw.lines() {
            if line.starts_with(':') {
                continue;
            }
            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "event" => frame.event = Some(value.to_string()),
                "data" => data.push(value),
                "id" => frame.id = Some(value.to_string()),
                _ => continue,
            }
            seen = true;
        }

        frame.data = data.join("\n");
        seen.then_some(frame)
    }
}

/// A fully buffered response.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers a dispatched response, event streams included.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be collected.
    pub async fn from_http(response: HttpResponse) -> Result<Self, TestError> {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Creates a response from raw parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec()).map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Splits an event-stream body into raw frames, comments dropped.
    #[must_use]
    pub fn sse_frames(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.body)
            .split("\n\n")
            .filter(|frame| !frame.is_empty() && !frame.starts_with(':'))
            .map(str::to_string)
            .collect()
    }

    /// Parses an event-stream body into frames.
    #[must_use]
    pub fn sse_events(&self) -> Vec<SseFrame> {
        self.sse_frames().iter().filter_map(|raw| SseFrame::parse(raw)).collect()
    }

    /// Returns the redirect target, `HX-Redirect` first, then `Location`.
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        self.header(HX_REDIRECT).or_else(|| self.header(LOCATION.as_str()))
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status differs.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "Expected status {expected}, got {}", self.status);
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        let actual = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(actual, expected, "Header '{name}': expected '{expected}', got '{actual}'");
        self
    }

    /// Asserts a `303` redirect to `to`, through either header.
    ///
    /// # Panics
    ///
    /// Panics if the response is not a redirect to `to`.
    pub fn assert_redirect(&self, to: &str) -> &Self {
        self.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(self.redirect_target(), Some(to), "Redirect target mismatch");
        self
    }

    /// Asserts the exact body text.
    ///
    /// # Panics
    ///
    /// Panics if the body is not UTF-8 or differs.
    pub fn assert_body_eq(&self, expected: &str) -> &Self {
        match self.text() {
            Ok(body) => assert_eq!(body, expected, "Body mismatch"),
            Err(e) => panic!("{e}"),
        }
        self
    }

    /// Asserts that a JSON field, addressed as `a.b.0`, equals `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or the field differs.
    pub fn assert_json_field(&self, path: &str, expected: &serde_json::Value) -> &Self {
        let json: serde_json::Value = match self.json() {
            Ok(json) => json,
            Err(e) => panic!("{e}"),
        };
        let actual = json_path(&json, path).unwrap_or_else(|| panic!("JSON path '{path}' not found in: {json}"));
        assert_eq!(actual, expected, "JSON field '{path}'");
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match segment.parse::<usize>() {
            Ok(index) => current.get(index),
            Err(_) => current.get(segment),
        })
}

//! Request body decoding.
//!
//! A request whose `Content-Type` is `application/json` is decoded as JSON.
//! Everything else is treated as URL-encoded form data; when the body is
//! empty the query string is decoded instead, which covers GET forms.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Returns true if the request declares a JSON body.
///
/// Media type parameters such as `charset` are ignored.
#[must_use]
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Decodes the request payload into `T`.
///
/// The body size is not checked here; the transport caps it before the
/// request reaches a handler.
pub fn decode_body<T: DeserializeOwned>(
    headers: &HeaderMap,
    query: Option<&str>,
    body: &Bytes,
) -> Result<T> {
    if is_json(headers) {
        return serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string()));
    }

    let form = if body.is_empty() {
        query.unwrap_or_default()
    } else {
        std::str::from_utf8(body).map_err(|e| Error::Decode(format!("invalid UTF-8: {e}")))?
    };

    serde_urlencoded::from_str(form).map_err(|e| Error::Decode(e.to_string()))
}

//! Response body types shared by the context and the transport.

use std::convert::Infallible;

use bytes::Bytes;
use http::Response;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};

/// Boxed response body: buffered for ordinary responses, streaming for
/// server-sent events.
pub type ResponseBody = UnsyncBoxBody<Bytes, Infallible>;

/// HTTP response type produced by the dispatch layer.
pub type HttpResponse = Response<ResponseBody>;

/// Wraps bytes as a complete body.
pub fn full(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into()).boxed_unsync()
}

/// An empty body.
pub fn empty() -> ResponseBody {
    Empty::new().boxed_unsync()
}

//! # Daedalus SSE
//!
//! Server-Sent Events support for Daedalus.
//!
//! Handlers normally reach this crate through `Context::set_sse_headers` and
//! `Context::send_sse`; the types here are the framing and the channel that
//! sit underneath.
//!
//! ```text
//! event: update
//! data: Hello, World!
//!
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod event;
mod stream;

pub use config::SseConfig;
pub use error::{SseError, SseResult};
pub use event::SseEvent;
pub use stream::{channel, SseSender, SseStream};

use http::{HeaderMap, HeaderName, HeaderValue};

/// Content type of an event stream.
pub const EVENT_STREAM: &str = "text/event-stream";

/// Headers sent with every event stream.
pub const SSE_HEADERS: [(&str, &str); 4] = [
    ("content-type", EVENT_STREAM),
    ("cache-control", "no-cache"),
    ("connection", "keep-alive"),
    ("access-control-allow-origin", "*"),
];

/// Writes the event-stream headers into `headers`, replacing existing values.
pub fn apply_headers(headers: &mut HeaderMap) {
    for (name, value) in SSE_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

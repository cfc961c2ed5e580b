//! Event framing.

use bytes::Bytes;
use serde::Serialize;
use std::time::Duration;

use crate::error::SseResult;

/// A single server-sent event.
///
/// Fields are written in the order `id`, `event`, `data`, `retry`, followed
/// by the blank line that terminates the event.
///
/// # Example
///
/// ```
/// use daedalus_sse::SseEvent;
///
/// let event = SseEvent::new("hello").event("greeting");
/// assert_eq!(event.to_sse_string(), "event: greeting\ndata: hello\n\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    id: Option<String>,
    event: Option<String>,
    data: String,
    retry: Option<Duration>,
}

impl SseEvent {
    /// Creates an unnamed event carrying `data`.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            id: None,
            event: None,
            data: data.into(),
            retry: None,
        }
    }

    /// Creates a named event; the shape written by `Context::send_sse`.
    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(data).event(event)
    }

    /// Creates an event whose data is `value` serialized as JSON.
    pub fn json<T: Serialize>(value: &T) -> SseResult<Self> {
        Ok(Self::new(serde_json::to_string(value)?))
    }

    /// Sets the event ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the event name.
    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Sets the reconnection hint.
    #[must_use]
    pub fn retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Returns the event name, if set.
    pub fn event_type(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// Returns the payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Formats the event in wire form.
    pub fn to_sse_string(&self) -> String {
        let mut out = String::with_capacity(self.data.len() + 32);

        if let Some(id) = &self.id {
            push_field(&mut out, "id", id);
        }
        if let Some(event) = &self.event {
            push_field(&mut out, "event", event);
        }

        // Every payload line gets its own prefix; an empty payload still
        // produces one data line.
        if self.data.is_empty() {
            push_field(&mut out, "data", "");
        } else {
            for line in self.data.lines() {
                push_field(&mut out, "data", line);
            }
        }

        if let Some(retry) = self.retry {
            push_field(&mut out, "retry", &retry.as_millis().to_string());
        }

        out.push('\n');
        out
    }

    /// Formats the event as a body frame payload.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.to_sse_string())
    }
}

fn push_field(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

/// Formats a comment line, used for keep-alive pings.
pub(crate) fn comment(text: &str) -> Bytes {
    Bytes::from(format!(": {text}\n\n"))
}

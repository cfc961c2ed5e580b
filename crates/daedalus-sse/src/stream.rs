//! Channel-backed event streams.
//!
//! [`channel`] returns a sender for the handler side and an [`SseStream`]
//! that the transport polls as a response body. Every event becomes its own
//! body frame, so hyper writes it out as soon as it is queued.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};

use crate::config::SseConfig;
use crate::error::{SseError, SseResult};
use crate::event::{comment, SseEvent};

/// Creates a connected sender and stream.
pub fn channel(config: &SseConfig) -> (SseSender, SseStream) {
    let (tx, rx) = mpsc::channel(config.buffer_size.max(1));
    let keep_alive = config
        .keep_alive_interval
        .map(|every| interval_at(Instant::now() + every, every));

    let sender = SseSender {
        tx,
        closed: Arc::new(AtomicBool::new(false)),
        events_sent: Arc::new(AtomicU64::new(0)),
    };

    (sender, SseStream { rx, keep_alive })
}

/// The handler side of an event stream.
///
/// Cloning yields another producer for the same stream.
#[derive(Debug, Clone)]
pub struct SseSender {
    tx: mpsc::Sender<Bytes>,
    closed: Arc<AtomicBool>,
    events_sent: Arc<AtomicU64>,
}

impl SseSender {
    /// Queues one event as one body frame.
    ///
    /// Waits when the buffer is full. Fails with [`SseError::Disconnected`]
    /// once the stream has been dropped by the transport.
    pub async fn send(&self, event: &SseEvent) -> SseResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SseError::stream_closed("sender closed"));
        }

        self.tx
            .send(event.to_bytes())
            .await
            .map_err(|_| SseError::Disconnected)?;

        self.events_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Returns true if the sender was closed or the client went away.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }

    /// Resolves once the receiving side has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }

    /// Marks the sender closed. Later sends fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Number of events delivered to the stream so far.
    pub fn events_sent(&self) -> u64 {
        self.events_sent.load(Ordering::Relaxed)
    }
}

/// The transport side of an event stream.
pub struct SseStream {
    rx: mpsc::Receiver<Bytes>,
    keep_alive: Option<Interval>,
}

impl std::fmt::Debug for SseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseStream")
            .field("keep_alive", &self.keep_alive.is_some())
            .finish_non_exhaustive()
    }
}

impl SseStream {
    /// Wraps the stream as a boxed HTTP body.
    pub fn into_body(self) -> UnsyncBoxBody<Bytes, Infallible> {
        StreamBody::new(self).boxed_unsync()
    }
}

impl Stream for SseStream {
    type Item = Result<Frame<Bytes>, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(bytes)) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => {
                if let Some(keep_alive) = self.keep_alive.as_mut() {
                    if keep_alive.poll_tick(cx).is_ready() {
                        tracing::trace!("sending sse keep-alive");
                        return Poll::Ready(Some(Ok(Frame::data(comment("keep-alive")))));
                    }
                }
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::time::Duration;

    fn frame_text(frame: Frame<Bytes>) -> String {
        let data = frame.into_data().unwrap_or_default();
        String::from_utf8(data.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_events_arrive_as_separate_frames() {
        let (sender, mut stream) = channel(&SseConfig::default());

        sender.send(&SseEvent::named("a", "1")).await.unwrap();
        sender.send(&SseEvent::named("b", "2")).await.unwrap();
        drop(sender);

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(frame_text(first), "event: a\ndata: 1\n\n");
        assert_eq!(frame_text(second), "event: b\ndata: 2\n\n");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_send_after_stream_dropped() {
        let (sender, stream) = channel(&SseConfig::default());
        drop(stream);

        assert!(sender.is_closed());
        let err = sender.send(&SseEvent::new("x")).await.unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn test_closed_resolves_when_stream_dropped() {
        let (sender, stream) = channel(&SseConfig::default());
        let waiter = tokio::spawn({
            let sender = sender.clone();
            async move { sender.closed().await }
        });
        drop(stream);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_explicit_close() {
        let (sender, _stream) = channel(&SseConfig::default());
        sender.close();
        assert!(matches!(
            sender.send(&SseEvent::new("x")).await,
            Err(SseError::StreamClosed(_))
        ));
        assert_eq!(sender.events_sent(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_comment() {
        let config = SseConfig::new().with_keep_alive(Duration::from_secs(5));
        let (_sender, mut stream) = channel(&config);

        let frame = stream.next().await.unwrap().unwrap();
        assert_eq!(frame_text(frame), ": keep-alive\n\n");
    }
}
